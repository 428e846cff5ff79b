use uuid::Uuid;

/// Error surface of the ledger: not-found, settled-market conflicts, and a
/// transient variant callers may retry.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("market not found: {0}")]
    MarketNotFound(Uuid),
    #[error("order not found: {0}")]
    OrderNotFound(Uuid),
    #[error("account not found: {user_id} on {chain_id}")]
    AccountNotFound { user_id: String, chain_id: String },
    #[error("market {0} is already settled")]
    MarketSettled(Uuid),
    #[error("ledger temporarily unavailable")]
    Unavailable,
}
