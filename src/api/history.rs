use crate::api::{parse_address, AppState};
use crate::domain::{HistoryOutcome, PositionHistory, ScanSummary};
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub pool: String,
    pub wallet: String,
}

/// `noHistoryFound` is distinct from an empty history: it means the scan
/// window held nothing attributable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub no_history_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<PositionHistory>,
    pub scan: ScanSummary,
}

pub async fn get_history(
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let pool = parse_address("pool", &params.pool)?;
    let wallet = parse_address("wallet", &params.wallet)?;

    let response = match state.analyzer.history(&pool, &wallet).await? {
        HistoryOutcome::Found(history) => HistoryResponse {
            no_history_found: false,
            scan: history.scan,
            history: Some(history),
        },
        HistoryOutcome::NoHistoryFound { scanned } => HistoryResponse {
            no_history_found: true,
            history: None,
            scan: scanned,
        },
    };
    Ok(Json(response))
}
