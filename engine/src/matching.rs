//! Price-time priority matching.
//!
//! Each new order runs as the taker against the resting book for its market
//! and token type. YES and NO are separate books: a YES order never crosses a
//! NO order. Every fill executes at the resting maker's price in its own
//! ledger transaction, so an aborted fill leaves the pass's earlier fills
//! committed and both orders in their last consistent state.

use ledger::{Ledger, Order, OrderStatus, Side, Trade};

use crate::{executor, EngineError};

/// Drive `taker` against the book until it fills, liquidity runs out, or a
/// fill aborts. Returns the trades produced, in execution order.
pub(crate) fn run(ledger: &Ledger, taker: &Order) -> Result<Vec<Trade>, EngineError> {
    let taker_id = taker.id;
    let mut fills = Vec::new();
    loop {
        let taker = ledger.order(taker_id)?;
        if taker.remaining() == 0 {
            break;
        }

        let book = ledger.open_orders(taker.market_id);
        let Some(maker) = best_opposing(&book, &taker) else {
            break;
        };

        if maker.remaining() == 0 {
            // Bookkeeping anomaly: resting as open with nothing left to
            // fill. Close it out and look again.
            tracing::warn!(
                order_id = %maker.id,
                market_id = %maker.market_id,
                "open order with zero remainder, marking filled"
            );
            let mut txn = ledger.begin();
            let mut stale = txn.order(maker.id)?;
            stale.status = OrderStatus::Filled;
            txn.save_order(stale);
            txn.commit();
            continue;
        }

        let quantity = taker.remaining().min(maker.remaining());
        // The resting maker's price governs execution.
        match executor::execute(ledger, &taker, &maker, quantity, maker.price) {
            Ok(trade) => fills.push(trade),
            Err(EngineError::LedgerInconsistency(detail)) => {
                tracing::error!(
                    taker_id = %taker.id,
                    maker_id = %maker.id,
                    market_id = %taker.market_id,
                    user_id = %maker.user_id,
                    detail = %detail,
                    "fill aborted on ledger inconsistency, terminating matching pass"
                );
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(fills)
}

/// Best-priced opposing order that crosses the taker's limit, oldest first
/// within a price level. The taker's own user is never a counterparty.
fn best_opposing(book: &[Order], taker: &Order) -> Option<Order> {
    let mut candidates: Vec<&Order> = book
        .iter()
        .filter(|o| o.token_type == taker.token_type)
        .filter(|o| o.user_id != taker.user_id)
        .filter(|o| match taker.side {
            Side::Buy => o.side == Side::Sell && o.price <= taker.price,
            Side::Sell => o.side == Side::Buy && o.price >= taker.price,
        })
        .collect();
    match taker.side {
        Side::Buy => candidates.sort_by(|a, b| a.price.cmp(&b.price).then(a.seq.cmp(&b.seq))),
        Side::Sell => candidates.sort_by(|a, b| b.price.cmp(&a.price).then(a.seq.cmp(&b.seq))),
    }
    candidates.first().map(|o| (*o).clone())
}
