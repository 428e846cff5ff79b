use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "open"),
            OrderStatus::PartiallyFilled => write!(f, "partially_filled"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A limit order for one outcome token. Quantities are whole share counts;
/// the price is a probability in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub market_id: Uuid,
    pub user_id: String,
    pub chain_id: String,
    pub side: Side,
    pub token_type: TokenType,
    pub price: Decimal,
    pub quantity: u64,
    pub filled_quantity: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Ledger-assigned admission sequence. Breaks price ties by arrival
    /// order even when two orders share a timestamp tick.
    pub seq: u64,
}

impl Order {
    pub fn new(
        market_id: Uuid,
        user_id: String,
        chain_id: String,
        side: Side,
        token_type: TokenType,
        price: Decimal,
        quantity: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            market_id,
            user_id,
            chain_id,
            side,
            token_type,
            price,
            quantity,
            filled_quantity: 0,
            status: OrderStatus::Open,
            created_at: Utc::now(),
            seq: 0,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}
