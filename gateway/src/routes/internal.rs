use axum::{extract::State, routing::post, Json, Router};
use engine::CreditDeposit;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{reject, Rejection};
use crate::AppState;

/// Internal ingress (called by the deposit indexer, not end users).
pub fn internal_routes() -> Router<AppState> {
    Router::new().route("/deposits", post(credit_deposit))
}

#[derive(Debug, Deserialize)]
pub struct CreditDepositRequest {
    pub user_id: String,
    pub chain_id: String,
    pub amount_usd: Decimal,
    pub external_tx_ref: String,
    pub external_block_height: u64,
}

#[derive(Debug, Serialize)]
pub struct CreditDepositResponse {
    pub success: bool,
    /// False when the event was a replay of an already-credited height.
    pub credited: bool,
    pub available_usd: Decimal,
}

async fn credit_deposit(
    State(state): State<AppState>,
    Json(req): Json<CreditDepositRequest>,
) -> Result<Json<CreditDepositResponse>, Rejection> {
    let receipt = state
        .engine
        .credit_deposit(&CreditDeposit {
            user_id: req.user_id,
            chain_id: req.chain_id,
            amount_usd: req.amount_usd,
            external_tx_ref: req.external_tx_ref,
            external_block_height: req.external_block_height,
        })
        .map_err(reject)?;

    Ok(Json(CreditDepositResponse {
        success: true,
        credited: receipt.credited,
        available_usd: receipt.available_usd,
    }))
}
