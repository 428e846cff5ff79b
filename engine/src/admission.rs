//! Order admission: parameter validation and asset locking.
//!
//! Locking happens in one ledger transaction together with the order insert,
//! so a failed lock leaves no trace. BUY orders lock funds at the limit
//! price; SELL orders reserve owned inventory first and collateralize the
//! shorted remainder one monetary unit per share.

use ledger::{Ledger, Order, Side};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{EngineError, SubmitOrder};

/// Validate price and quantity. Returns the parsed limit price.
pub(crate) fn validate(req: &SubmitOrder) -> Result<Decimal, EngineError> {
    if req.quantity == 0 {
        return Err(EngineError::InvalidQuantity);
    }
    let price: Decimal = req
        .price
        .parse()
        .map_err(|_| EngineError::InvalidPrice(req.price.clone()))?;
    if price < Decimal::ZERO || price > Decimal::ONE {
        return Err(EngineError::InvalidPrice(req.price.clone()));
    }
    Ok(price)
}

/// Lock the order's backing assets and persist it in OPEN state.
pub(crate) fn admit(
    ledger: &Ledger,
    market_id: Uuid,
    req: &SubmitOrder,
    price: Decimal,
) -> Result<Order, EngineError> {
    let mut txn = ledger.begin();

    let market = txn.market(market_id)?;
    if market.settled {
        return Err(EngineError::MarketClosed);
    }

    let quantity = Decimal::from(req.quantity);
    let account = txn.account_mut(&req.user_id, &req.chain_id);
    // Zero position record on first reference within the market.
    account.position_mut(market_id);
    match req.side {
        Side::Buy => {
            let cost = price * quantity;
            if account.available_usd < cost {
                return Err(EngineError::InsufficientFunds {
                    required: cost,
                    available: account.available_usd,
                });
            }
            account.available_usd -= cost;
        }
        Side::Sell => {
            let token = req.token_type;
            let owned = account.position(market_id).free_tokens(token);
            let from_inventory = owned.min(req.quantity);
            let short = req.quantity - from_inventory;
            let collateral = Decimal::from(short);
            if account.available_usd < collateral {
                return Err(EngineError::InsufficientFunds {
                    required: collateral,
                    available: account.available_usd,
                });
            }
            account.available_usd -= collateral;
            let position = account.position_mut(market_id);
            *position.free_tokens_mut(token) -= from_inventory;
            *position.locked_tokens_mut(token) += from_inventory;
            *position.locked_collateral_mut(token) += collateral;
        }
    }

    let order = txn.insert_order(Order::new(
        market_id,
        req.user_id.clone(),
        req.chain_id.clone(),
        req.side,
        req.token_type,
        price,
        req.quantity,
    ));
    txn.commit();
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledger::{Market, TokenType};
    use rust_decimal_macros::dec;
    use sigverify::SignatureProof;

    const CHAIN: &str = "solana";

    fn setup(funds: Decimal) -> (Ledger, Uuid) {
        let ledger = Ledger::new();
        let market = Market::new("Will BTC close above 100k?".into(), "carol".into(), Utc::now());
        let market_id = market.id;
        let mut txn = ledger.begin();
        txn.insert_market(market);
        txn.account_mut("alice", CHAIN).available_usd = funds;
        txn.commit();
        (ledger, market_id)
    }

    fn request(market_id: Uuid, side: Side, price: &str, quantity: u64) -> SubmitOrder {
        SubmitOrder {
            market_id: market_id.to_string(),
            user_id: "alice".into(),
            chain_id: CHAIN.into(),
            side,
            token_type: TokenType::Yes,
            price: price.into(),
            quantity,
            proof: SignatureProof::default(),
            deadline: None,
        }
    }

    #[test]
    fn rejects_out_of_range_prices() {
        let (_, market_id) = setup(dec!(100));
        for bad in ["-0.01", "1.01", "2", "abc"] {
            let err = validate(&request(market_id, Side::Buy, bad, 10)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidPrice(_)), "price {bad}");
        }
        // Boundary prices are admitted.
        assert_eq!(validate(&request(market_id, Side::Buy, "0", 10)).unwrap(), dec!(0));
        assert_eq!(validate(&request(market_id, Side::Buy, "1", 10)).unwrap(), dec!(1));
    }

    #[test]
    fn rejects_zero_quantity() {
        let (_, market_id) = setup(dec!(100));
        let err = validate(&request(market_id, Side::Buy, "0.5", 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity));
    }

    #[test]
    fn buy_locks_funds_at_limit_price() {
        let (ledger, market_id) = setup(dec!(100));
        let req = request(market_id, Side::Buy, "0.60", 10);
        let order = admit(&ledger, market_id, &req, dec!(0.60)).unwrap();

        assert_eq!(order.status, ledger::OrderStatus::Open);
        let account = ledger.account("alice", CHAIN).unwrap();
        assert_eq!(account.available_usd, dec!(94));
    }

    #[test]
    fn buy_at_zero_price_locks_nothing() {
        let (ledger, market_id) = setup(dec!(100));
        let req = request(market_id, Side::Buy, "0", 10);
        admit(&ledger, market_id, &req, dec!(0)).unwrap();
        assert_eq!(ledger.account("alice", CHAIN).unwrap().available_usd, dec!(100));
    }

    #[test]
    fn buy_without_funds_fails_and_rolls_back() {
        let (ledger, market_id) = setup(dec!(4));
        let req = request(market_id, Side::Buy, "0.50", 10);
        let err = admit(&ledger, market_id, &req, dec!(0.50)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(ledger.account("alice", CHAIN).unwrap().available_usd, dec!(4));
        assert!(ledger.open_orders(market_id).is_empty());
    }

    #[test]
    fn sell_with_inventory_locks_tokens() {
        let (ledger, market_id) = setup(dec!(100));
        let mut txn = ledger.begin();
        txn.account_mut("alice", CHAIN).position_mut(market_id).yes_tokens = 10;
        txn.commit();

        let req = request(market_id, Side::Sell, "0.50", 10);
        admit(&ledger, market_id, &req, dec!(0.50)).unwrap();

        let position = ledger.account("alice", CHAIN).unwrap().position(market_id);
        assert_eq!(position.yes_tokens, 0);
        assert_eq!(position.locked_yes_tokens, 10);
        assert_eq!(position.locked_collateral_yes, dec!(0));
        // Selling from inventory never touches funds.
        assert_eq!(ledger.account("alice", CHAIN).unwrap().available_usd, dec!(100));
    }

    #[test]
    fn short_sell_locks_collateral_for_uncovered_remainder() {
        let (ledger, market_id) = setup(dec!(100));
        let mut txn = ledger.begin();
        txn.account_mut("alice", CHAIN).position_mut(market_id).yes_tokens = 3;
        txn.commit();

        let req = request(market_id, Side::Sell, "0.50", 10);
        admit(&ledger, market_id, &req, dec!(0.50)).unwrap();

        let account = ledger.account("alice", CHAIN).unwrap();
        let position = account.position(market_id);
        assert_eq!(position.yes_tokens, 0);
        assert_eq!(position.locked_yes_tokens, 3);
        assert_eq!(position.locked_collateral_yes, dec!(7));
        assert_eq!(account.available_usd, dec!(93));
    }

    #[test]
    fn short_sell_without_collateral_fails() {
        let (ledger, market_id) = setup(dec!(5));
        let req = request(market_id, Side::Sell, "0.50", 10);
        let err = admit(&ledger, market_id, &req, dec!(0.50)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        let account = ledger.account("alice", CHAIN).unwrap();
        assert_eq!(account.available_usd, dec!(5));
        assert!(account.position(market_id).is_flat());
    }

    #[test]
    fn settled_market_rejects_admission() {
        let (ledger, market_id) = setup(dec!(100));
        let mut txn = ledger.begin();
        txn.mark_settled(market_id, TokenType::Yes).unwrap();
        txn.commit();

        let req = request(market_id, Side::Buy, "0.50", 10);
        let err = admit(&ledger, market_id, &req, dec!(0.50)).unwrap_err();
        assert!(matches!(err, EngineError::MarketClosed));
    }

    #[test]
    fn unknown_market_is_not_found() {
        let (ledger, _) = setup(dec!(100));
        let other = Uuid::new_v4();
        let req = request(other, Side::Buy, "0.50", 10);
        let err = admit(&ledger, other, &req, dec!(0.50)).unwrap_err();
        assert!(matches!(err, EngineError::MarketNotFound(_)));
    }
}
