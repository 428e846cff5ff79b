use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenType;

/// An executed fill between a buy and a sell order. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub market_id: Uuid,
    pub buy_order_id: Uuid,
    pub sell_order_id: Uuid,
    pub token_type: TokenType,
    pub price: Decimal,
    pub quantity: u64,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn new(
        market_id: Uuid,
        buy_order_id: Uuid,
        sell_order_id: Uuid,
        token_type: TokenType,
        price: Decimal,
        quantity: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            market_id,
            buy_order_id,
            sell_order_id,
            token_type,
            price,
            quantity,
            executed_at: Utc::now(),
        }
    }
}
