pub mod health;
pub mod history;
pub mod metrics;
pub mod positions;

use crate::domain::{self, Address};
use crate::error::AppError;
use crate::orchestration::Analyzer;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/positions", get(positions::get_positions))
        .route("/v1/history", get(history::get_history))
        .route("/v1/metrics", get(metrics::get_metrics))
        .route("/v1/metrics/compare", get(metrics::get_mode_comparison))
        .layer(cors)
        .with_state(state)
}

/// Parse a `0x`-prefixed 20-byte hex address from a query parameter.
pub(crate) fn parse_address(field: &str, raw: &str) -> Result<Address, AppError> {
    domain::parse_address(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid {} address: {}", field, e)))
}
