//! Market settlement: the terminal transition at a known outcome.
//!
//! One ledger transaction cancels every open order, refunds BUY pre-locks,
//! releases reserved seller assets (inventory, and the collateral behind
//! unfilled short remainders, which never minted anything), redeems winning
//! tokens at one unit each, returns the collateral behind losing-token
//! shorts, and forfeits the collateral behind winning-token shorts. The
//! forfeited amount is exactly what funds the minted winning longs.

use std::collections::HashMap;

use ledger::{Ledger, LedgerError, Market, OrderStatus, Position, Side, TokenType};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::EngineError;

pub(crate) fn settle(
    ledger: &Ledger,
    market_id: Uuid,
    outcome: TokenType,
) -> Result<Market, EngineError> {
    let mut txn = ledger.begin();

    // Terminal transition first: a second settlement attempt conflicts here
    // and nothing below runs.
    txn.mark_settled(market_id, outcome).map_err(|e| match e {
        LedgerError::MarketSettled(_) => EngineError::AlreadySettled,
        other => other.into(),
    })?;

    // Cancel open orders. BUY pre-locks refund immediately; SELL remainders
    // are collected per account so the reservation behind them can be
    // released below.
    let mut sell_remainders: HashMap<(String, String), (u64, u64)> = HashMap::new();
    let mut cancelled = 0usize;
    for order in txn.open_orders(market_id) {
        let unfilled = order.remaining();
        let mut update = order.clone();
        update.status = OrderStatus::Cancelled;
        txn.save_order(update);
        cancelled += 1;

        match order.side {
            Side::Buy => {
                if unfilled > 0 {
                    let account = txn.account_mut(&order.user_id, &order.chain_id);
                    account.available_usd += order.price * Decimal::from(unfilled);
                }
            }
            Side::Sell => {
                let entry = sell_remainders
                    .entry((order.user_id.clone(), order.chain_id.clone()))
                    .or_default();
                match order.token_type {
                    TokenType::Yes => entry.0 += unfilled,
                    TokenType::No => entry.1 += unfilled,
                }
            }
        }
    }

    let losing = outcome.opposite();
    let mut paid_out = Decimal::ZERO;
    let mut forfeited = Decimal::ZERO;
    for key in txn.accounts_in_market(market_id) {
        let (rem_yes, rem_no) = sell_remainders.get(&key).copied().unwrap_or_default();
        let account = txn.account_mut(&key.0, &key.1);
        let Some(position) = account.positions.get_mut(&market_id) else {
            continue;
        };

        // Fills consume reserved inventory before collateral, so whatever
        // part of an unfilled sell remainder is not covered by locked tokens
        // was collateral-reserved and never minted. That reservation returns.
        let unfilled_short_yes = rem_yes.saturating_sub(position.locked_yes_tokens);
        let unfilled_short_no = rem_no.saturating_sub(position.locked_no_tokens);
        let released_yes = Decimal::from(unfilled_short_yes).min(position.locked_collateral_yes);
        let released_no = Decimal::from(unfilled_short_no).min(position.locked_collateral_no);
        position.locked_collateral_yes -= released_yes;
        position.locked_collateral_no -= released_no;

        // Reserved inventory back to the free side.
        position.yes_tokens += position.locked_yes_tokens;
        position.locked_yes_tokens = 0;
        position.no_tokens += position.locked_no_tokens;
        position.locked_no_tokens = 0;

        // Winning tokens redeem at one unit each; collateral behind shorts
        // of the losing token returns (those minted tokens now pay zero).
        // Collateral behind shorts of the winning token is forfeited: it
        // funds the redemption of the longs those shorts minted.
        let payout = Decimal::from(position.free_tokens(outcome)) + position.locked_collateral(losing);
        forfeited += position.locked_collateral(outcome);
        paid_out += payout;

        *position = Position::default();
        account.available_usd += released_yes + released_no + payout;
    }

    txn.commit();
    tracing::info!(
        market_id = %market_id,
        outcome = %outcome,
        cancelled_orders = cancelled,
        paid_out = %paid_out,
        forfeited = %forfeited,
        "market settled"
    );
    Ok(ledger.market(market_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{admission, matching, SubmitOrder};
    use chrono::Utc;
    use ledger::Order;
    use rust_decimal_macros::dec;
    use sigverify::SignatureProof;

    const CHAIN: &str = "solana";

    fn setup(users: &[&str]) -> (Ledger, Uuid) {
        let ledger = Ledger::new();
        let market = Market::new("Will the rocket land?".into(), "carol".into(), Utc::now());
        let market_id = market.id;
        let mut txn = ledger.begin();
        txn.insert_market(market);
        for user in users {
            txn.account_mut(user, CHAIN).available_usd = dec!(100);
        }
        txn.commit();
        (ledger, market_id)
    }

    fn place(
        ledger: &Ledger,
        market_id: Uuid,
        user: &str,
        side: Side,
        token: TokenType,
        price: &str,
        qty: u64,
    ) -> Order {
        let req = SubmitOrder {
            market_id: market_id.to_string(),
            user_id: user.into(),
            chain_id: CHAIN.into(),
            side,
            token_type: token,
            price: price.into(),
            quantity: qty,
            proof: SignatureProof::default(),
            deadline: None,
        };
        let price = admission::validate(&req).unwrap();
        let order = admission::admit(ledger, market_id, &req, price).unwrap();
        matching::run(ledger, &order).unwrap();
        ledger.order(order.id).unwrap()
    }

    #[test]
    fn settles_minted_market_with_forfeiture() {
        let (ledger, market_id) = setup(&["a", "b"]);
        place(&ledger, market_id, "a", Side::Buy, TokenType::Yes, "0.50", 10);
        place(&ledger, market_id, "b", Side::Sell, TokenType::Yes, "0.50", 10);

        let market = settle(&ledger, market_id, TokenType::Yes).unwrap();
        assert!(market.settled);
        assert_eq!(market.outcome, Some(TokenType::Yes));

        // a paid 5.00 and redeems 10 YES at 1.00 each.
        let a = ledger.account("a", CHAIN).unwrap();
        assert_eq!(a.available_usd, dec!(105));
        assert!(a.position(market_id).is_flat());

        // b received 5.00, forfeits the 10 collateral, and holds worthless NO.
        let b = ledger.account("b", CHAIN).unwrap();
        assert_eq!(b.available_usd, dec!(95));
        assert!(b.position(market_id).is_flat());
    }

    #[test]
    fn no_outcome_returns_short_collateral() {
        let (ledger, market_id) = setup(&["a", "b"]);
        place(&ledger, market_id, "a", Side::Buy, TokenType::Yes, "0.50", 10);
        place(&ledger, market_id, "b", Side::Sell, TokenType::Yes, "0.50", 10);

        settle(&ledger, market_id, TokenType::No).unwrap();

        // a's YES pays zero.
        assert_eq!(ledger.account("a", CHAIN).unwrap().available_usd, dec!(95));
        // b's short YES won: collateral returns, and the paired NO pays 1.00
        // each on top of the 5.00 proceeds.
        assert_eq!(ledger.account("b", CHAIN).unwrap().available_usd, dec!(115));
    }

    #[test]
    fn cancels_and_refunds_open_buy_orders() {
        let (ledger, market_id) = setup(&["a"]);
        let order = place(&ledger, market_id, "a", Side::Buy, TokenType::Yes, "0.60", 10);
        assert_eq!(ledger.account("a", CHAIN).unwrap().available_usd, dec!(94));

        settle(&ledger, market_id, TokenType::Yes).unwrap();

        assert_eq!(ledger.order(order.id).unwrap().status, OrderStatus::Cancelled);
        assert_eq!(ledger.account("a", CHAIN).unwrap().available_usd, dec!(100));
    }

    #[test]
    fn releases_unfilled_short_reservation() {
        let (ledger, market_id) = setup(&["a"]);
        // A short sell that never trades: 10 collateral reserved, 0 minted.
        place(&ledger, market_id, "a", Side::Sell, TokenType::Yes, "0.80", 10);
        assert_eq!(ledger.account("a", CHAIN).unwrap().available_usd, dec!(90));

        settle(&ledger, market_id, TokenType::Yes).unwrap();

        // Nothing minted, so nothing is forfeited: the reservation returns.
        let a = ledger.account("a", CHAIN).unwrap();
        assert_eq!(a.available_usd, dec!(100));
        assert!(a.position(market_id).is_flat());
    }

    #[test]
    fn releases_locked_inventory_of_unfilled_sells() {
        let (ledger, market_id) = setup(&["a", "b"]);
        // Mint 10 YES for a (b shorts them).
        place(&ledger, market_id, "a", Side::Buy, TokenType::Yes, "0.50", 10);
        place(&ledger, market_id, "b", Side::Sell, TokenType::Yes, "0.50", 10);
        // a relists the inventory but nobody buys.
        place(&ledger, market_id, "a", Side::Sell, TokenType::Yes, "0.90", 10);

        settle(&ledger, market_id, TokenType::Yes).unwrap();

        // The locked inventory was released back before redemption.
        assert_eq!(ledger.account("a", CHAIN).unwrap().available_usd, dec!(105));
    }

    #[test]
    fn second_settlement_fails_without_side_effects() {
        let (ledger, market_id) = setup(&["a", "b"]);
        place(&ledger, market_id, "a", Side::Buy, TokenType::Yes, "0.50", 10);
        place(&ledger, market_id, "b", Side::Sell, TokenType::Yes, "0.50", 10);

        settle(&ledger, market_id, TokenType::Yes).unwrap();
        let before = ledger.account("a", CHAIN).unwrap().available_usd;

        let err = settle(&ledger, market_id, TokenType::No).unwrap_err();
        assert!(matches!(err, EngineError::AlreadySettled));

        let market = ledger.market(market_id).unwrap();
        assert_eq!(market.outcome, Some(TokenType::Yes));
        assert_eq!(ledger.account("a", CHAIN).unwrap().available_usd, before);
    }

    #[test]
    fn settling_unknown_market_is_not_found() {
        let (ledger, _) = setup(&[]);
        let err = settle(&ledger, Uuid::new_v4(), TokenType::Yes).unwrap_err();
        assert!(matches!(err, EngineError::MarketNotFound(_)));
    }
}
