use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use engine::MarketBook;
use ledger::{Market, Order, TokenType, Trade};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{reject, Rejection};
use crate::AppState;

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_market).get(list_markets))
        .route("/:id", get(get_market))
        .route("/:id/settle", post(settle_market))
        .route("/:id/orders", get(list_open_orders))
        .route("/:id/trades", get(list_trades))
        .route("/:id/book", get(get_book))
}

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub question: String,
    pub creator: String,
    pub resolves_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MarketResponse {
    pub success: bool,
    pub market: Market,
}

#[derive(Debug, Deserialize)]
pub struct SettleMarketRequest {
    pub outcome: TokenType,
}

#[derive(Debug, Deserialize)]
pub struct TradeFilter {
    pub token_type: Option<TokenType>,
}

async fn create_market(
    State(state): State<AppState>,
    Json(req): Json<CreateMarketRequest>,
) -> Result<Json<MarketResponse>, Rejection> {
    let market = state
        .engine
        .create_market(&req.question, &req.creator, req.resolves_at)
        .map_err(reject)?;
    Ok(Json(MarketResponse { success: true, market }))
}

async fn list_markets(State(state): State<AppState>) -> Json<Vec<Market>> {
    Json(state.engine.markets())
}

async fn get_market(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Market>, Rejection> {
    state.engine.market(id).map(Json).map_err(reject)
}

async fn settle_market(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SettleMarketRequest>,
) -> Result<Json<MarketResponse>, Rejection> {
    let market = state.engine.settle_market(id, req.outcome).await.map_err(reject)?;
    Ok(Json(MarketResponse { success: true, market }))
}

async fn list_open_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Order>>, Rejection> {
    state.engine.open_orders(id).map(Json).map_err(reject)
}

async fn list_trades(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filter): Query<TradeFilter>,
) -> Result<Json<Vec<Trade>>, Rejection> {
    state.engine.trades(id, filter.token_type).map(Json).map_err(reject)
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MarketBook>, Rejection> {
    state.engine.book(id).map(Json).map_err(reject)
}
