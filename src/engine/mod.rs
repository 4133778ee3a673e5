//! Discovery, history reconstruction, baseline derivation and attribution.
//!
//! `discovery` and `history` read the ledger; `baseline` and `attribution`
//! are pure functions over their results.

pub mod attribution;
pub mod baseline;
pub mod discovery;
pub mod history;

pub use attribution::{
    compute_metrics, daily_breakdown, il_multiplier, pure_il_percent, AttributionError,
    DailyBreakdown, DailySnapshot,
};
pub use baseline::{BaselineMode, ParseBaselineModeError};
pub use discovery::{probe_pool, DiscoveryError, PoolProbe, PositionDiscovery};
pub use history::{HistoryError, HistoryReconstructor};
