pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use engine::Engine;
use serde::Serialize;

use routes::{balance_routes, internal_routes, market_routes, order_routes};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Deadline handed to order admission; expiry before the admission
    /// transaction commits fails the request with no persistent effect.
    pub request_deadline: Duration,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

/// The full application router: user-facing `/api` routes plus the
/// `/internal` ingress the deposit indexer calls.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/markets", market_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/balances", balance_routes())
        .nest("/internal", internal_routes())
        .with_state(state)
}
