//! Entry and current snapshots, and the metrics computed from them.

use crate::domain::{LiquidityEventKind, LpPosition, TimeMs, TxHash};
use serde::{Deserialize, Serialize};

/// What an entry baseline was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BaselineOrigin {
    /// Net of every Add and Remove in the scanned history.
    Aggregate { adds: usize, removes: usize },
    /// A single event.
    #[serde(rename_all = "camelCase")]
    Event {
        kind: LiquidityEventKind,
        transaction_hash: TxHash,
        block_number: u64,
    },
}

/// Assumed starting point for IL/fee attribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBaseline {
    pub token0_amount: f64,
    pub token1_amount: f64,
    pub k: f64,
    pub timestamp: Option<TimeMs>,
    pub origin: BaselineOrigin,
}

/// The wallet's present exposure plus live prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSnapshot {
    pub token0_amount: f64,
    pub token1_amount: f64,
    pub reserve0: f64,
    pub reserve1: f64,
    pub share: f64,
    pub price0: f64,
    pub price1: f64,
}

impl CurrentSnapshot {
    pub fn from_position(position: &LpPosition, price0: f64, price1: f64) -> Self {
        CurrentSnapshot {
            token0_amount: position.token0_amount,
            token1_amount: position.token1_amount,
            reserve0: position.pool.reserve0(),
            reserve1: position.pool.reserve1(),
            share: position.share,
            price0,
            price1,
        }
    }
}

/// IL / fee / PnL attribution for one position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub position_value: f64,
    pub hodl_value: f64,
    pub net_pnl: f64,
    pub net_pnl_percent: f64,
    pub pure_il: f64,
    pub pure_il_percent: f64,
    pub fees_earned: f64,
    pub fees_earned_percent: f64,
    pub current_token0: f64,
    pub current_token1: f64,
    pub token0_change: f64,
    pub token1_change: f64,
    pub time_in_pool_ms: i64,
    pub days_in_pool: f64,
    /// None when there is no entry time or no elapsed time to annualize over.
    pub annualized_return: Option<f64>,
    pub il_multiplier: f64,
    pub price_ratio_change: f64,
    pub user_share: f64,
}
