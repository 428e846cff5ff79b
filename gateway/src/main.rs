use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use engine::Engine;
use ledger::Ledger;
use sigverify::SignatureVerifier;
use tower_http::cors::{Any, CorsLayer};

use gateway::{app, AppState};

const DEFAULT_CHAIN_SCHEMES: &str = "solana=ed25519,cosmoshub=adr36,devnet=trusted";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway=debug,engine=debug,tower_http=debug".into()),
        )
        .init();

    // Config from env
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let chain_schemes =
        env::var("CHAIN_SCHEMES").unwrap_or_else(|_| DEFAULT_CHAIN_SCHEMES.to_string());
    let request_deadline_ms: u64 = env::var("REQUEST_DEADLINE_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);

    let verifier = SignatureVerifier::from_spec(&chain_schemes)
        .map_err(|e| anyhow::anyhow!("invalid CHAIN_SCHEMES: {e}"))?;
    tracing::info!("chain schemes: {chain_schemes}");

    let state = AppState {
        engine: Arc::new(Engine::new(Ledger::new(), verifier)),
        request_deadline: Duration::from_millis(request_deadline_ms),
    };

    // CORS: explicit origins in production, permissive in development.
    let cors = if let Ok(origins) = env::var("CORS_ALLOWED_ORIGINS") {
        let allowed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    };

    let router = app(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("exchange gateway listening on {}", bind_addr);
    axum::serve(listener, router).await?;

    Ok(())
}
