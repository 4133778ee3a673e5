//! Liquidity events and reconstructed position history.

use crate::domain::{Address, TimeMs, Token, TxHash};
use serde::{Deserialize, Serialize};

/// Direction of a liquidity change, seen from the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityEventKind {
    /// Wallet received LP shares.
    Add,
    /// Wallet sent LP shares away.
    Remove,
}

/// Where an event's underlying token amounts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountSource {
    /// Decoded from the pool's own Mint/Burn event in the same transaction.
    NativeEvent,
    /// Reserve × share-transfer / total supply. Reduced precision: ignores
    /// the pool's rounding and any imbalance in the deposit.
    Apportioned,
    /// No reserve snapshot could be found for the block.
    Unavailable,
}

/// Pool reserves as of the reserve-update matched to an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSnapshot {
    pub reserve0: f64,
    pub reserve1: f64,
    /// True when the update came from the event's own transaction.
    pub same_transaction: bool,
}

impl ReserveSnapshot {
    pub fn k(&self) -> f64 {
        self.reserve0 * self.reserve1
    }
}

/// One observed share movement into or out of the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityEvent {
    pub kind: LiquidityEventKind,
    pub pool: Address,
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub log_index: u64,
    pub timestamp: Option<TimeMs>,
    pub lp_amount: f64,
    pub amount0: f64,
    pub amount1: f64,
    pub amount_source: AmountSource,
    pub reserves: Option<ReserveSnapshot>,
    /// Invariant at the block; 0 when reserves are unknown.
    pub k: f64,
}

impl LiquidityEvent {
    /// Chain order: block height, then emission order within the block.
    pub fn chain_position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// How much of the ledger a history scan covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub chunks_queried: u32,
    pub chunks_failed: u32,
    /// Oldest block any window reached; events below it were never looked at.
    pub lowest_block_scanned: u64,
}

impl ScanSummary {
    /// Combine the coverage of two scans over the same range.
    pub fn merge(self, other: ScanSummary) -> ScanSummary {
        ScanSummary {
            chunks_queried: self.chunks_queried + other.chunks_queried,
            chunks_failed: self.chunks_failed + other.chunks_failed,
            lowest_block_scanned: self.lowest_block_scanned.min(other.lowest_block_scanned),
        }
    }
}

/// The ordered event timeline for one pool/wallet pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionHistory {
    pub pool: Address,
    pub wallet: Address,
    pub token0: Token,
    pub token1: Token,
    /// Sorted by (block_number, log_index) ascending.
    pub events: Vec<LiquidityEvent>,
    pub add_count: usize,
    pub remove_count: usize,
    pub first_timestamp: Option<TimeMs>,
    pub last_timestamp: Option<TimeMs>,
    pub scan: ScanSummary,
}

impl PositionHistory {
    /// Sort events into chain order and derive the summary counts.
    pub fn new(
        pool: Address,
        wallet: Address,
        token0: Token,
        token1: Token,
        mut events: Vec<LiquidityEvent>,
        scan: ScanSummary,
    ) -> Self {
        events.sort_by_key(LiquidityEvent::chain_position);
        let add_count = events
            .iter()
            .filter(|e| e.kind == LiquidityEventKind::Add)
            .count();
        let remove_count = events.len() - add_count;
        let first_timestamp = events.iter().filter_map(|e| e.timestamp).min();
        let last_timestamp = events.iter().filter_map(|e| e.timestamp).max();
        PositionHistory {
            pool,
            wallet,
            token0,
            token1,
            events,
            add_count,
            remove_count,
            first_timestamp,
            last_timestamp,
            scan,
        }
    }
}

/// Result of a history reconstruction.
///
/// `NoHistoryFound` means the scan window held nothing attributable; it is
/// not a proof that the wallet never used the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum HistoryOutcome {
    Found(PositionHistory),
    NoHistoryFound { scanned: ScanSummary },
}

impl HistoryOutcome {
    pub fn into_history(self) -> Option<PositionHistory> {
        match self {
            HistoryOutcome::Found(history) => Some(history),
            HistoryOutcome::NoHistoryFound { .. } => None,
        }
    }
}
