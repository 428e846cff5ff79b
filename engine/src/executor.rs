//! Trade execution: applies one fill to both parties inside one ledger
//! transaction.
//!
//! The buyer's funds were locked at admission at their own limit price, so
//! execution only credits the seller and refunds the buyer any price
//! improvement. Token delivery prefers the seller's reserved inventory;
//! whatever remains is synthesized as a short sale, minting a long for the
//! buyer and the paired opposite token for the seller. The collateral behind
//! the short stays locked until settlement.

use ledger::{Ledger, Order, OrderStatus, Side, Trade};
use rust_decimal::Decimal;

use crate::EngineError;

pub(crate) fn execute(
    ledger: &Ledger,
    taker: &Order,
    maker: &Order,
    quantity: u64,
    exec_price: Decimal,
) -> Result<Trade, EngineError> {
    let (buy_id, sell_id) = match taker.side {
        Side::Buy => (taker.id, maker.id),
        Side::Sell => (maker.id, taker.id),
    };

    let mut txn = ledger.begin();
    let mut buy = txn.order(buy_id)?;
    let mut sell = txn.order(sell_id)?;
    let market_id = buy.market_id;
    let token = buy.token_type;
    let qty = Decimal::from(quantity);

    // Short-sale capacity check before any mutation. A shortfall here means
    // the admission-time lock was lost: abort this fill only.
    let seller_position = txn
        .account(&sell.user_id, &sell.chain_id)
        .map(|a| a.position(market_id))
        .unwrap_or_default();
    let from_inventory = seller_position.locked_tokens(token).min(quantity);
    let short = quantity - from_inventory;
    if short > 0 && seller_position.locked_collateral(token) < Decimal::from(short) {
        return Err(EngineError::LedgerInconsistency(format!(
            "short sale by {} in market {} needs {} {} collateral, holds {}",
            sell.user_id,
            market_id,
            short,
            token,
            seller_position.locked_collateral(token),
        )));
    }

    // Seller: payment in, reserved inventory out. A shorted unit mints the
    // paired opposite token for the seller; its collateral stays locked.
    {
        let seller = txn.account_mut(&sell.user_id, &sell.chain_id);
        seller.available_usd += exec_price * qty;
        let position = seller.position_mut(market_id);
        *position.locked_tokens_mut(token) -= from_inventory;
        if short > 0 {
            *position.free_tokens_mut(token.opposite()) += short;
        }
    }

    // Buyer: the pre-lock covers exec_price * qty; anything above it is
    // price improvement and returns to the buyer's free balance.
    let refund = (buy.price - exec_price) * qty;
    {
        let buyer = txn.account_mut(&buy.user_id, &buy.chain_id);
        if refund > Decimal::ZERO {
            buyer.available_usd += refund;
        }
        *buyer.position_mut(market_id).free_tokens_mut(token) += quantity;
    }

    apply_fill(&mut buy, quantity);
    apply_fill(&mut sell, quantity);
    txn.save_order(buy);
    txn.save_order(sell);

    let trade = Trade::new(market_id, buy_id, sell_id, token, exec_price, quantity);
    txn.insert_trade(trade.clone());
    txn.commit();

    tracing::info!(
        trade_id = %trade.id,
        market_id = %market_id,
        token = %token,
        price = %exec_price,
        quantity,
        minted = short,
        "trade executed"
    );
    Ok(trade)
}

fn apply_fill(order: &mut Order, quantity: u64) {
    order.filled_quantity += quantity;
    order.status = if order.filled_quantity >= order.quantity {
        OrderStatus::Filled
    } else {
        OrderStatus::PartiallyFilled
    };
}
