use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two outcome tokens of a binary market. Doubles as the settlement
/// outcome: settling at `Yes` redeems YES tokens at one unit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Yes,
    No,
}

impl TokenType {
    pub fn opposite(&self) -> Self {
        match self {
            TokenType::Yes => TokenType::No,
            TokenType::No => TokenType::Yes,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Yes => write!(f, "yes"),
            TokenType::No => write!(f, "no"),
        }
    }
}

/// A binary market. Mutated exactly once after creation, by settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: Uuid,
    pub question: String,
    pub creator: String,
    pub resolves_at: DateTime<Utc>,
    pub outcome: Option<TokenType>,
    pub settled: bool,
    pub created_at: DateTime<Utc>,
}

impl Market {
    pub fn new(question: String, creator: String, resolves_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            creator,
            resolves_at,
            outcome: None,
            settled: false,
            created_at: Utc::now(),
        }
    }
}
