use crate::domain::{
    Address, AmountSource, CurrentSnapshot, EntryBaseline, HistoryOutcome, LiquidityEventKind,
    LpPosition, Metrics, PositionHistory, ScanSummary, TimeMs,
};
use crate::engine::{
    compute_metrics, AttributionError, BaselineMode, DiscoveryError, HistoryError,
    HistoryReconstructor, PositionDiscovery,
};
use crate::ledger::{LedgerClient, LedgerError, ScanConfig};
use crate::prices::{PriceError, PriceFeed};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("Price feed error: {0}")]
    Prices(#[from] PriceError),
    #[error("Wallet {wallet} holds no shares in {pool}")]
    NoPosition { pool: Address, wallet: Address },
    #[error("No current price for token {0}")]
    MissingPrice(Address),
    #[error("No liquidity events found in the scanned range")]
    NoHistory { scanned: ScanSummary },
    #[error("History has no usable events for a baseline")]
    NoBaseline,
    #[error(transparent)]
    Attribution(#[from] AttributionError),
}

impl AnalysisError {
    /// Machine-readable reason for "not enough data" outcomes, `None` for
    /// failures of the services themselves.
    pub fn insufficient_data_reason(&self) -> Option<&'static str> {
        match self {
            AnalysisError::NoPosition { .. } => Some("noPosition"),
            AnalysisError::MissingPrice(_) => Some("missingPrice"),
            AnalysisError::NoHistory { .. } => Some("noHistoryFound"),
            AnalysisError::NoBaseline => Some("noBaseline"),
            AnalysisError::Attribution(AttributionError::NonPositiveEntry { .. }) => {
                Some("nonPositiveEntry")
            }
            AnalysisError::Attribution(AttributionError::InvalidCurrent(_)) => {
                Some("invalidCurrent")
            }
            AnalysisError::History(HistoryError::NotAPool(_)) => Some("notAPool"),
            _ => None,
        }
    }
}

/// Metrics for one position under one baseline mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub mode: BaselineMode,
    pub position: LpPosition,
    pub baseline: EntryBaseline,
    /// Baseline amounts at prices from the baseline's own time, when the
    /// oracle has them.
    pub entry_value: Option<f64>,
    /// Adds minus removes, each valued at prices from its own block time.
    /// `None` when any event lacks amounts, a timestamp or a price.
    pub net_deposited_value: Option<f64>,
    pub metrics: Metrics,
    pub event_count: usize,
    pub add_count: usize,
    pub remove_count: usize,
    pub scan: ScanSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ModeOutcome {
    #[serde(rename_all = "camelCase")]
    Computed {
        baseline: EntryBaseline,
        metrics: Metrics,
    },
    Unavailable {
        reason: String,
    },
}

/// Both baseline modes computed from a single history read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeComparison {
    pub position: LpPosition,
    pub full_history: ModeOutcome,
    pub since_last_action: ModeOutcome,
    /// The modes can only disagree once there is more than one event.
    pub modes_differ: bool,
    pub event_count: usize,
    pub add_count: usize,
    pub remove_count: usize,
}

/// Everything the metrics need, gathered once.
struct Inputs {
    position: LpPosition,
    current: CurrentSnapshot,
    history: PositionHistory,
}

/// Ties discovery, history, prices and attribution together per request.
#[derive(Debug, Clone)]
pub struct Analyzer {
    ledger: Arc<dyn LedgerClient>,
    discovery: PositionDiscovery,
    history: HistoryReconstructor,
    prices: Arc<dyn PriceFeed>,
}

impl Analyzer {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        prices: Arc<dyn PriceFeed>,
        scan_config: ScanConfig,
    ) -> Self {
        Self {
            discovery: PositionDiscovery::new(ledger.clone(), scan_config),
            history: HistoryReconstructor::new(ledger.clone(), scan_config),
            ledger,
            prices,
        }
    }

    pub async fn chain_head(&self) -> Result<u64, LedgerError> {
        self.ledger.latest_block().await
    }

    pub async fn positions(&self, wallet: &Address) -> Result<Vec<LpPosition>, AnalysisError> {
        Ok(self.discovery.discover_positions(wallet).await?)
    }

    pub async fn history(
        &self,
        pool: &Address,
        wallet: &Address,
    ) -> Result<HistoryOutcome, AnalysisError> {
        Ok(self.history.reconstruct_history(pool, wallet).await?)
    }

    /// Attribute the live position in `pool` against the `mode` baseline.
    pub async fn report(
        &self,
        pool: &Address,
        wallet: &Address,
        mode: BaselineMode,
    ) -> Result<PositionReport, AnalysisError> {
        let Inputs {
            position,
            current,
            history,
        } = self.gather(pool, wallet).await?;

        let baseline = mode.derive(&history.events).ok_or(AnalysisError::NoBaseline)?;
        let metrics = compute_metrics(&baseline, &current, TimeMs::now())?;
        let (entry_value, net_deposited_value) =
            self.historical_values(&baseline, &history).await;

        info!(
            pool = %pool,
            wallet = %wallet,
            mode = %mode,
            net_pnl = metrics.net_pnl,
            "Computed position report"
        );

        Ok(PositionReport {
            mode,
            position,
            baseline,
            entry_value,
            net_deposited_value,
            metrics,
            event_count: history.events.len(),
            add_count: history.add_count,
            remove_count: history.remove_count,
            scan: history.scan,
        })
    }

    /// Compute both modes; a mode that cannot be computed is reported as
    /// unavailable rather than failing the comparison.
    pub async fn compare_modes(
        &self,
        pool: &Address,
        wallet: &Address,
    ) -> Result<ModeComparison, AnalysisError> {
        let Inputs {
            position,
            current,
            history,
        } = self.gather(pool, wallet).await?;
        let now = TimeMs::now();

        let outcome = |mode: BaselineMode| {
            let Some(baseline) = mode.derive(&history.events) else {
                return ModeOutcome::Unavailable {
                    reason: AnalysisError::NoBaseline.to_string(),
                };
            };
            match compute_metrics(&baseline, &current, now) {
                Ok(metrics) => ModeOutcome::Computed { baseline, metrics },
                Err(e) => ModeOutcome::Unavailable {
                    reason: e.to_string(),
                },
            }
        };

        Ok(ModeComparison {
            full_history: outcome(BaselineMode::FullHistory),
            since_last_action: outcome(BaselineMode::SinceLastAction),
            modes_differ: history.events.len() > 1,
            event_count: history.events.len(),
            add_count: history.add_count,
            remove_count: history.remove_count,
            position,
        })
    }

    async fn gather(&self, pool: &Address, wallet: &Address) -> Result<Inputs, AnalysisError> {
        let (position, outcome) = tokio::join!(
            self.discovery.load_position(pool, wallet),
            self.history.reconstruct_history(pool, wallet),
        );
        let position = position?.ok_or(AnalysisError::NoPosition {
            pool: *pool,
            wallet: *wallet,
        })?;

        let token0 = position.pool.token0.address;
        let token1 = position.pool.token1.address;
        let quotes = self.prices.current_prices(&[token0, token1]).await?;
        let price = |token: Address| {
            quotes
                .get(&token)
                .map(|q| q.price)
                .ok_or(AnalysisError::MissingPrice(token))
        };
        let current = CurrentSnapshot::from_position(&position, price(token0)?, price(token1)?);

        let history = match outcome? {
            HistoryOutcome::Found(history) => history,
            HistoryOutcome::NoHistoryFound { scanned } => {
                return Err(AnalysisError::NoHistory { scanned })
            }
        };

        Ok(Inputs {
            position,
            current,
            history,
        })
    }

    /// Baseline value at the baseline's own time, and the net value the
    /// wallet put in, from one batch of historical lookups per token.
    async fn historical_values(
        &self,
        baseline: &EntryBaseline,
        history: &PositionHistory,
    ) -> (Option<f64>, Option<f64>) {
        let entry_at = baseline.timestamp.map(|t| t.as_unix_seconds());
        let stamps: BTreeSet<i64> = history
            .events
            .iter()
            .filter_map(|e| e.timestamp)
            .map(|t| t.as_unix_seconds())
            .chain(entry_at)
            .collect();
        if stamps.is_empty() {
            return (None, None);
        }
        let stamps: Vec<i64> = stamps.into_iter().collect();
        let (prices0, prices1) = tokio::join!(
            self.prices.historical_prices(&history.token0.address, &stamps),
            self.prices.historical_prices(&history.token1.address, &stamps),
        );
        let valuer = HistoricalValuer { prices0, prices1 };

        let entry_value = entry_at
            .and_then(|at| valuer.value(at, baseline.token0_amount, baseline.token1_amount));
        let net_deposited_value = history
            .events
            .iter()
            .map(|e| {
                if e.amount_source == AmountSource::Unavailable {
                    return None;
                }
                let value = valuer.value(e.timestamp?.as_unix_seconds(), e.amount0, e.amount1)?;
                Some(match e.kind {
                    LiquidityEventKind::Add => value,
                    LiquidityEventKind::Remove => -value,
                })
            })
            .sum::<Option<f64>>();
        (entry_value, net_deposited_value)
    }
}

struct HistoricalValuer {
    prices0: BTreeMap<i64, Option<f64>>,
    prices1: BTreeMap<i64, Option<f64>>,
}

impl HistoricalValuer {
    fn value(&self, at: i64, amount0: f64, amount1: f64) -> Option<f64> {
        let p0 = self.prices0.get(&at).copied().flatten()?;
        let p1 = self.prices1.get(&at).copied().flatten()?;
        Some(amount0 * p0 + amount1 * p1)
    }
}
