use std::time::Instant;

use axum::{extract::State, routing::post, Json, Router};
use ledger::{OrderStatus, Side, TokenType, Trade};
use serde::{Deserialize, Serialize};
use sigverify::SignatureProof;
use uuid::Uuid;

use crate::error::{reject, Rejection};
use crate::AppState;

pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", post(submit_order))
}

/// Order submission payload. `price` stays a string end to end: the engine
/// parses it for the book but hands the original text to the signature
/// verifier for message reconstruction.
#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub market_id: String,
    pub user_id: String,
    pub chain_id: String,
    pub wallet_address: String,
    pub side: Side,
    pub token_type: TokenType,
    pub price: String,
    pub quantity: u64,
    pub signature: String,
    pub session_public_key: Option<String>,
    pub session_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOrderResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub filled_quantity: u64,
    pub fills: Vec<Trade>,
}

async fn submit_order(
    State(state): State<AppState>,
    Json(req): Json<SubmitOrderRequest>,
) -> Result<Json<SubmitOrderResponse>, Rejection> {
    let outcome = state
        .engine
        .submit_order(engine::SubmitOrder {
            market_id: req.market_id,
            user_id: req.user_id,
            chain_id: req.chain_id,
            side: req.side,
            token_type: req.token_type,
            price: req.price,
            quantity: req.quantity,
            proof: SignatureProof {
                signature: req.signature,
                wallet_address: req.wallet_address,
                session_public_key: req.session_public_key,
                session_address: req.session_address,
            },
            deadline: Some(Instant::now() + state.request_deadline),
        })
        .await
        .map_err(reject)?;

    Ok(Json(SubmitOrderResponse {
        success: true,
        order_id: outcome.order.id,
        status: outcome.order.status,
        filled_quantity: outcome.order.filled_quantity,
        fills: outcome.fills,
    }))
}
