use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenType;

/// Per-market holdings of one account: free and locked token inventory plus
/// the monetary collateral reserved behind open short sales of each token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub yes_tokens: u64,
    pub no_tokens: u64,
    pub locked_yes_tokens: u64,
    pub locked_no_tokens: u64,
    pub locked_collateral_yes: Decimal,
    pub locked_collateral_no: Decimal,
}

impl Position {
    pub fn free_tokens(&self, token: TokenType) -> u64 {
        match token {
            TokenType::Yes => self.yes_tokens,
            TokenType::No => self.no_tokens,
        }
    }

    pub fn free_tokens_mut(&mut self, token: TokenType) -> &mut u64 {
        match token {
            TokenType::Yes => &mut self.yes_tokens,
            TokenType::No => &mut self.no_tokens,
        }
    }

    pub fn locked_tokens(&self, token: TokenType) -> u64 {
        match token {
            TokenType::Yes => self.locked_yes_tokens,
            TokenType::No => self.locked_no_tokens,
        }
    }

    pub fn locked_tokens_mut(&mut self, token: TokenType) -> &mut u64 {
        match token {
            TokenType::Yes => &mut self.locked_yes_tokens,
            TokenType::No => &mut self.locked_no_tokens,
        }
    }

    pub fn locked_collateral(&self, token: TokenType) -> Decimal {
        match token {
            TokenType::Yes => self.locked_collateral_yes,
            TokenType::No => self.locked_collateral_no,
        }
    }

    pub fn locked_collateral_mut(&mut self, token: TokenType) -> &mut Decimal {
        match token {
            TokenType::Yes => &mut self.locked_collateral_yes,
            TokenType::No => &mut self.locked_collateral_no,
        }
    }

    /// True when every field is zero, i.e. the post-settlement state.
    pub fn is_flat(&self) -> bool {
        self.yes_tokens == 0
            && self.no_tokens == 0
            && self.locked_yes_tokens == 0
            && self.locked_no_tokens == 0
            && self.locked_collateral_yes.is_zero()
            && self.locked_collateral_no.is_zero()
    }
}

/// One user's ledger entry on one chain: free funds, deposit watermark, and
/// the per-market positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub chain_id: String,
    pub available_usd: Decimal,
    /// Highest external block height credited so far. Deposit events at or
    /// below this height are replays from an indexer restart.
    pub last_deposit_height: Option<u64>,
    pub positions: HashMap<Uuid, Position>,
}

impl Account {
    pub fn new(user_id: String, chain_id: String) -> Self {
        Self {
            user_id,
            chain_id,
            available_usd: Decimal::ZERO,
            last_deposit_height: None,
            positions: HashMap::new(),
        }
    }

    pub fn position(&self, market_id: Uuid) -> Position {
        self.positions.get(&market_id).cloned().unwrap_or_default()
    }

    pub fn position_mut(&mut self, market_id: Uuid) -> &mut Position {
        self.positions.entry(market_id).or_default()
    }
}
