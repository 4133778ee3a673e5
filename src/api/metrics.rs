use crate::api::{parse_address, AppState};
use crate::engine::BaselineMode;
use crate::error::AppError;
use crate::orchestration::{ModeComparison, PositionReport};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub pool: String,
    pub wallet: String,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub pool: String,
    pub wallet: String,
}

pub async fn get_metrics(
    Query(params): Query<MetricsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionReport>, AppError> {
    let pool = parse_address("pool", &params.pool)?;
    let wallet = parse_address("wallet", &params.wallet)?;
    let mode = match params.mode.as_deref() {
        Some(m) => BaselineMode::from_str(m).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => BaselineMode::default(),
    };

    let report = state.analyzer.report(&pool, &wallet, mode).await?;
    Ok(Json(report))
}

pub async fn get_mode_comparison(
    Query(params): Query<CompareQuery>,
    State(state): State<AppState>,
) -> Result<Json<ModeComparison>, AppError> {
    let pool = parse_address("pool", &params.pool)?;
    let wallet = parse_address("wallet", &params.wallet)?;

    let comparison = state.analyzer.compare_modes(&pool, &wallet).await?;
    Ok(Json(comparison))
}
