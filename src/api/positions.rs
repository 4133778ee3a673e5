use crate::api::{parse_address, AppState};
use crate::domain::{Address, LpPosition};
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    pub wallet: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub wallet: Address,
    pub positions: Vec<LpPosition>,
}

pub async fn get_positions(
    Query(params): Query<PositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionsResponse>, AppError> {
    let wallet = parse_address("wallet", &params.wallet)?;

    let mut positions = state.analyzer.positions(&wallet).await?;
    positions.sort_by(|a, b| a.pool.address.cmp(&b.pool.address));

    Ok(Json(PositionsResponse { wallet, positions }))
}
