//! Price-level aggregated book snapshots for the read API.

use std::collections::BTreeMap;

use ledger::{Ledger, Order, Side, TokenType};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::EngineError;

#[derive(Debug, Clone, Serialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: u64,
}

/// One token type's book: open quantity per price level plus the summary
/// numbers a trading UI needs.
#[derive(Debug, Clone, Serialize)]
pub struct SideBook {
    /// Buy levels, best (highest) first.
    pub bids: Vec<BookLevel>,
    /// Sell levels, best (lowest) first.
    pub asks: Vec<BookLevel>,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub spread: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketBook {
    pub market_id: Uuid,
    pub yes: SideBook,
    pub no: SideBook,
}

pub(crate) fn snapshot(ledger: &Ledger, market_id: Uuid) -> Result<MarketBook, EngineError> {
    ledger.market(market_id)?;
    let orders = ledger.open_orders(market_id);
    Ok(MarketBook {
        market_id,
        yes: side_book(&orders, TokenType::Yes),
        no: side_book(&orders, TokenType::No),
    })
}

fn side_book(orders: &[Order], token: TokenType) -> SideBook {
    let mut bid_levels: BTreeMap<Decimal, u64> = BTreeMap::new();
    let mut ask_levels: BTreeMap<Decimal, u64> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.token_type == token) {
        let levels = match order.side {
            Side::Buy => &mut bid_levels,
            Side::Sell => &mut ask_levels,
        };
        *levels.entry(order.price).or_default() += order.remaining();
    }

    let best_bid = bid_levels.keys().next_back().copied();
    let best_ask = ask_levels.keys().next().copied();
    let spread = match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => Some(ask - bid),
        _ => None,
    };

    SideBook {
        bids: bid_levels
            .into_iter()
            .rev()
            .map(|(price, quantity)| BookLevel { price, quantity })
            .collect(),
        asks: ask_levels
            .into_iter()
            .map(|(price, quantity)| BookLevel { price, quantity })
            .collect(),
        best_bid,
        best_ask,
        spread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(side: Side, token: TokenType, price: Decimal, qty: u64, filled: u64) -> Order {
        let mut o = Order::new(
            Uuid::new_v4(),
            "maker".into(),
            "solana".into(),
            side,
            token,
            price,
            qty,
        );
        o.filled_quantity = filled;
        o
    }

    #[test]
    fn aggregates_levels_and_nets_fills() {
        let orders = vec![
            order(Side::Buy, TokenType::Yes, dec!(0.40), 10, 0),
            order(Side::Buy, TokenType::Yes, dec!(0.40), 5, 2),
            order(Side::Buy, TokenType::Yes, dec!(0.45), 5, 0),
            order(Side::Sell, TokenType::Yes, dec!(0.55), 8, 0),
            order(Side::Sell, TokenType::No, dec!(0.30), 4, 0),
        ];
        let book = side_book(&orders, TokenType::Yes);

        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.bids[0].price, dec!(0.45));
        assert_eq!(book.bids[1].quantity, 13);
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.best_bid, Some(dec!(0.45)));
        assert_eq!(book.best_ask, Some(dec!(0.55)));
        assert_eq!(book.spread, Some(dec!(0.10)));
    }

    #[test]
    fn empty_side_has_no_summary() {
        let orders = vec![order(Side::Buy, TokenType::Yes, dec!(0.40), 10, 0)];
        let book = side_book(&orders, TokenType::Yes);
        assert_eq!(book.best_bid, Some(dec!(0.40)));
        assert_eq!(book.best_ask, None);
        assert_eq!(book.spread, None);

        let no_book = side_book(&orders, TokenType::No);
        assert!(no_book.bids.is_empty());
        assert!(no_book.asks.is_empty());
    }
}
