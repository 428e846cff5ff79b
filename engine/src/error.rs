use ledger::LedgerError;
use rust_decimal::Decimal;
use sigverify::VerifyError;

/// Error taxonomy surfaced to callers. Each variant has a stable wire code
/// used by transport adapters.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // Validation
    #[error("price must be within [0, 1], got {0}")]
    InvalidPrice(String),
    #[error("quantity must be a positive integer")]
    InvalidQuantity,
    #[error("invalid chain identifier: {0}")]
    InvalidChain(String),
    #[error("malformed signature material: {0}")]
    MalformedSignature(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),

    // Authorization
    #[error("signature does not authorize this order")]
    Unauthorized,
    #[error("no signature scheme configured for chain: {0}")]
    UnsupportedChain(String),

    // Business
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("market not found: {0}")]
    MarketNotFound(String),
    #[error("market is closed to trading")]
    MarketClosed,
    #[error("market is already settled")]
    AlreadySettled,
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },
    #[error("insufficient token inventory")]
    InsufficientTokens,

    // Integrity: aborts the enclosing transaction, never a caller mistake
    #[error("ledger inconsistency: {0}")]
    LedgerInconsistency(String),

    // Transient
    #[error("ledger temporarily unavailable")]
    Unavailable,
    #[error("deadline exceeded before admission")]
    DeadlineExceeded,
}

impl EngineError {
    /// Stable SCREAMING_SNAKE code for transport error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidPrice(_) => "INVALID_PRICE",
            EngineError::InvalidQuantity => "INVALID_QUANTITY",
            EngineError::InvalidChain(_) => "INVALID_CHAIN",
            EngineError::MalformedSignature(_) => "MALFORMED_SIGNATURE",
            EngineError::MissingField(_) => "MISSING_FIELD",
            EngineError::Unauthorized => "UNAUTHORIZED",
            EngineError::UnsupportedChain(_) => "UNSUPPORTED_CHAIN",
            EngineError::UserNotFound(_) => "USER_NOT_FOUND",
            EngineError::MarketNotFound(_) => "MARKET_NOT_FOUND",
            EngineError::MarketClosed => "MARKET_CLOSED",
            EngineError::AlreadySettled => "ALREADY_SETTLED",
            EngineError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            EngineError::InsufficientTokens => "INSUFFICIENT_TOKENS",
            EngineError::LedgerInconsistency(_) => "LEDGER_INCONSISTENCY",
            EngineError::Unavailable => "UNAVAILABLE",
            EngineError::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    /// Whether the caller may retry the identical request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Unavailable | EngineError::DeadlineExceeded)
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::MarketNotFound(id) => EngineError::MarketNotFound(id.to_string()),
            LedgerError::OrderNotFound(id) => {
                EngineError::LedgerInconsistency(format!("order {id} vanished mid-operation"))
            }
            LedgerError::AccountNotFound { user_id, .. } => EngineError::UserNotFound(user_id),
            LedgerError::MarketSettled(_) => EngineError::MarketClosed,
            LedgerError::Unavailable => EngineError::Unavailable,
        }
    }
}

impl From<VerifyError> for EngineError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::UnsupportedChain(chain) => EngineError::UnsupportedChain(chain),
            VerifyError::Missing(field) => EngineError::MissingField(field),
            VerifyError::MalformedEncoding { .. } => EngineError::MalformedSignature(e.to_string()),
            VerifyError::BadSignature => EngineError::Unauthorized,
        }
    }
}
