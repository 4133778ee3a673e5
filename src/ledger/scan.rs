//! Backward chunked log scanning under a per-query block-span limit.
//!
//! The scan walks from the chain head toward genesis one window at a time
//! and stops at the first window that yields any match. This is cheap for
//! recently active wallets but lossy: activity older than the first hit, or
//! older than `max_chunks` windows, is never looked at. Callers report the
//! covered range (`lowest_block_scanned`) instead of claiming completeness.

use super::{LedgerClient, LedgerError, LogFilter, LogRecord};
use crate::domain::ScanSummary;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Scan parameters, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Blocks per `get_logs` window.
    pub chunk_size: u64,
    /// Maximum number of windows walked per scan.
    pub max_chunks: u32,
    /// Deadline for one window query; a timed-out window counts as failed.
    pub request_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            chunk_size: 40_000,
            max_chunks: 10,
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Logs found by a scan plus how far back it looked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Sorted by (block number, log index).
    pub logs: Vec<LogRecord>,
    pub chunks_queried: u32,
    pub chunks_failed: u32,
    pub lowest_block_scanned: u64,
    pub stopped_on_match: bool,
}

impl ScanOutcome {
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            chunks_queried: self.chunks_queried,
            chunks_failed: self.chunks_failed,
            lowest_block_scanned: self.lowest_block_scanned,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkedScanner {
    ledger: Arc<dyn LedgerClient>,
    config: ScanConfig,
}

impl ChunkedScanner {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: ScanConfig) -> Self {
        Self { ledger, config }
    }

    /// Scan backward from the chain head for logs matching `filter`.
    ///
    /// A failed or timed-out window is logged, counted in `chunks_failed`
    /// and skipped. The scan only errors when the head block cannot be read,
    /// or when every window failed because the endpoint was unreachable.
    /// A node that answers with errors is not an outage.
    pub async fn scan(&self, filter: &LogFilter) -> Result<ScanOutcome, LedgerError> {
        let head = self.ledger.latest_block().await?;
        let width = self.config.chunk_size.max(1);

        let mut outcome = ScanOutcome {
            lowest_block_scanned: head,
            ..Default::default()
        };
        let mut last_outage = None;
        let mut answered = false;
        let mut to_block = head;

        while outcome.chunks_queried < self.config.max_chunks {
            let from_block = to_block.saturating_sub(width - 1);
            outcome.chunks_queried += 1;
            outcome.lowest_block_scanned = from_block;

            match self.query_window(filter, from_block, to_block).await {
                Ok(logs) => {
                    debug!(from_block, to_block, hits = logs.len(), "Scanned log window");
                    outcome.logs.extend(logs);
                }
                Err(e) => {
                    warn!(from_block, to_block, error = %e, "Log window failed, treating as empty");
                    outcome.chunks_failed += 1;
                    if e.is_connectivity() {
                        last_outage = Some(e);
                    } else {
                        answered = true;
                    }
                }
            }

            if !outcome.logs.is_empty() {
                outcome.stopped_on_match = true;
                break;
            }
            if from_block == 0 {
                break;
            }
            to_block = from_block - 1;
        }

        if outcome.chunks_failed == outcome.chunks_queried && !answered {
            if let Some(e) = last_outage {
                return Err(e);
            }
        }

        outcome.logs.sort_by_key(LogRecord::chain_position);
        Ok(outcome)
    }

    async fn query_window(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogRecord>, LedgerError> {
        match tokio::time::timeout(
            self.config.request_timeout,
            self.ledger.get_logs(filter, from_block, to_block),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout),
        }
    }
}
