//! Domain types for LP position discovery and attribution.
//!
//! This module provides:
//! - Ledger primitives: Address, TxHash, TimeMs
//! - Pool, token and live position state
//! - Liquidity events and reconstructed histories
//! - Entry/current snapshots and the metrics record

pub mod event;
pub mod pool;
pub mod primitives;
pub mod snapshot;
pub mod token;
pub mod units;

pub use event::{
    AmountSource, HistoryOutcome, LiquidityEvent, LiquidityEventKind, PositionHistory,
    ReserveSnapshot, ScanSummary,
};
pub use pool::{LpPosition, Pool};
pub use primitives::{parse_address, Address, AddressParseError, TimeMs, TxHash};
pub use snapshot::{BaselineOrigin, CurrentSnapshot, EntryBaseline, Metrics};
pub use token::Token;
