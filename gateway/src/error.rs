use axum::http::StatusCode;
use axum::Json;
use engine::EngineError;
use serde::Serialize;

/// Structured error body: success flag, stable error code, human detail.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub detail: String,
}

pub type Rejection = (StatusCode, Json<ErrorBody>);

/// Map a core error onto a transport status plus the structured body.
pub fn reject(e: EngineError) -> Rejection {
    let status = match &e {
        EngineError::InvalidPrice(_)
        | EngineError::InvalidQuantity
        | EngineError::InvalidChain(_)
        | EngineError::MalformedSignature(_)
        | EngineError::MissingField(_)
        | EngineError::InsufficientFunds { .. }
        | EngineError::InsufficientTokens => StatusCode::BAD_REQUEST,
        EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
        EngineError::UnsupportedChain(_) => StatusCode::BAD_REQUEST,
        EngineError::UserNotFound(_) | EngineError::MarketNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::MarketClosed | EngineError::AlreadySettled => StatusCode::CONFLICT,
        EngineError::LedgerInconsistency(_) => {
            tracing::error!("ledger inconsistency surfaced to transport: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    };
    (
        status,
        Json(ErrorBody {
            success: false,
            error: e.code(),
            detail: e.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_statuses() {
        let cases = [
            (EngineError::InvalidPrice("2".into()), StatusCode::BAD_REQUEST, "INVALID_PRICE"),
            (EngineError::Unauthorized, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (EngineError::MarketNotFound("m".into()), StatusCode::NOT_FOUND, "MARKET_NOT_FOUND"),
            (EngineError::AlreadySettled, StatusCode::CONFLICT, "ALREADY_SETTLED"),
            (EngineError::Unavailable, StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            (EngineError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
        ];
        for (err, expected_status, expected_code) in cases {
            let (status, Json(body)) = reject(err);
            assert_eq!(status, expected_status);
            assert_eq!(body.error, expected_code);
            assert!(!body.success);
        }
    }
}
