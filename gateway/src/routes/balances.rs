use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use ledger::Position;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;

pub fn balance_routes() -> Router<AppState> {
    Router::new().route("/:chain_id/:user_id", get(get_balance))
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub chain_id: String,
    pub available_usd: Decimal,
    pub markets: HashMap<Uuid, Position>,
}

/// Read-only view of one (user, chain) ledger entry. A user the indexer has
/// never credited reads as an empty account rather than an error.
async fn get_balance(
    State(state): State<AppState>,
    Path((chain_id, user_id)): Path<(String, String)>,
) -> Json<BalanceResponse> {
    match state.engine.balance(&user_id, &chain_id) {
        Some(account) => Json(BalanceResponse {
            user_id: account.user_id,
            chain_id: account.chain_id,
            available_usd: account.available_usd,
            markets: account.positions,
        }),
        None => Json(BalanceResponse {
            user_id,
            chain_id,
            available_usd: Decimal::ZERO,
            markets: HashMap::new(),
        }),
    }
}
