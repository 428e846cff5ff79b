//! Deposit ingress from the multi-chain indexer.
//!
//! The indexer replays credit events after restarts, so crediting is
//! idempotent by external block height per (user, chain): a stale height is
//! acknowledged without effect.

use ledger::Ledger;
use rust_decimal::Decimal;

use crate::EngineError;

/// A credit event emitted by the deposit indexer.
#[derive(Debug, Clone)]
pub struct CreditDeposit {
    pub user_id: String,
    pub chain_id: String,
    pub amount_usd: Decimal,
    pub external_tx_ref: String,
    pub external_block_height: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DepositReceipt {
    /// False when the event was a replay and the ledger is unchanged.
    pub credited: bool,
    pub available_usd: Decimal,
}

pub(crate) fn credit(ledger: &Ledger, req: &CreditDeposit) -> Result<DepositReceipt, EngineError> {
    if req.user_id.trim().is_empty() {
        return Err(EngineError::MissingField("user_id"));
    }
    if req.chain_id.trim().is_empty() {
        return Err(EngineError::InvalidChain("empty chain id".into()));
    }
    if req.amount_usd <= Decimal::ZERO {
        return Err(EngineError::InvalidQuantity);
    }

    let mut txn = ledger.begin();
    let account = txn.account_mut(&req.user_id, &req.chain_id);

    if let Some(last) = account.last_deposit_height {
        if req.external_block_height <= last {
            tracing::debug!(
                user_id = %req.user_id,
                chain_id = %req.chain_id,
                tx_ref = %req.external_tx_ref,
                height = req.external_block_height,
                last_height = last,
                "stale deposit event ignored"
            );
            let available_usd = account.available_usd;
            drop(txn);
            return Ok(DepositReceipt { credited: false, available_usd });
        }
    }

    account.available_usd += req.amount_usd;
    account.last_deposit_height = Some(req.external_block_height);
    let available_usd = account.available_usd;
    txn.commit();

    tracing::info!(
        user_id = %req.user_id,
        chain_id = %req.chain_id,
        amount = %req.amount_usd,
        tx_ref = %req.external_tx_ref,
        height = req.external_block_height,
        "deposit credited"
    );
    Ok(DepositReceipt { credited: true, available_usd })
}
