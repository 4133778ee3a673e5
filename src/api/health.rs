use crate::api::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// Ready once the ledger endpoint answers a head-block query.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.analyzer.chain_head().await {
        Ok(block) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "latestBlock": block})),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "error": e.to_string()})),
            )
        }
    }
}
