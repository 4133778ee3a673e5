//! Entry baseline derivation policies.

use crate::domain::{BaselineOrigin, EntryBaseline, LiquidityEvent, LiquidityEventKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the entry point of a position is chosen from its event history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaselineMode {
    /// Net of all adds and removes seen.
    #[default]
    FullHistory,
    /// The most recent event alone.
    SinceLastAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown baseline mode '{0}', expected fullHistory or sinceLastAction")]
pub struct ParseBaselineModeError(pub String);

impl BaselineMode {
    pub const ALL: [BaselineMode; 2] = [BaselineMode::FullHistory, BaselineMode::SinceLastAction];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineMode::FullHistory => "fullHistory",
            BaselineMode::SinceLastAction => "sinceLastAction",
        }
    }

    /// Derive the entry baseline for this mode. `None` for an empty history.
    pub fn derive(self, events: &[LiquidityEvent]) -> Option<EntryBaseline> {
        if events.is_empty() {
            return None;
        }
        match self {
            BaselineMode::FullHistory => Some(full_history(events)),
            BaselineMode::SinceLastAction => since_last_action(events),
        }
    }
}

impl fmt::Display for BaselineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaselineMode {
    type Err = ParseBaselineModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullHistory" | "full_history" => Ok(BaselineMode::FullHistory),
            "sinceLastAction" | "since_last_action" => Ok(BaselineMode::SinceLastAction),
            other => Err(ParseBaselineModeError(other.to_string())),
        }
    }
}

/// Adds minus removes, clamped at zero per token.
///
/// A negative net means the scan window missed earlier adds. k is the
/// average over adds weighted by LP amount, where an add with a zero LP
/// amount still weighs 1.
fn full_history(events: &[LiquidityEvent]) -> EntryBaseline {
    let mut net0 = 0.0;
    let mut net1 = 0.0;
    let mut weighted_k = 0.0;
    let mut total_weight = 0.0;
    let mut adds = 0;
    let mut removes = 0;
    let mut timestamp = None;

    for event in events {
        match event.kind {
            LiquidityEventKind::Add => {
                net0 += event.amount0;
                net1 += event.amount1;
                let weight = if event.lp_amount > 0.0 {
                    event.lp_amount
                } else {
                    1.0
                };
                weighted_k += event.k * weight;
                total_weight += weight;
                adds += 1;
                timestamp = match (timestamp, event.timestamp) {
                    (Some(a), Some(b)) => Some(std::cmp::min(a, b)),
                    (a, b) => a.or(b),
                };
            }
            LiquidityEventKind::Remove => {
                net0 -= event.amount0;
                net1 -= event.amount1;
                removes += 1;
            }
        }
    }

    EntryBaseline {
        token0_amount: f64::max(net0, 0.0),
        token1_amount: f64::max(net1, 0.0),
        k: if total_weight > 0.0 {
            weighted_k / total_weight
        } else {
            0.0
        },
        timestamp,
        origin: BaselineOrigin::Aggregate { adds, removes },
    }
}

fn since_last_action(events: &[LiquidityEvent]) -> Option<EntryBaseline> {
    let last = events.iter().max_by_key(|e| e.chain_position())?;
    Some(EntryBaseline {
        token0_amount: last.amount0,
        token1_amount: last.amount1,
        k: last.k,
        timestamp: last.timestamp,
        origin: BaselineOrigin::Event {
            kind: last.kind,
            transaction_hash: last.transaction_hash,
            block_number: last.block_number,
        },
    })
}
