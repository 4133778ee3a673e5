//! In-memory ledger for tests and offline runs.

use super::{LedgerClient, LedgerError, LogFilter, LogRecord};
use crate::domain::{Address, TimeMs};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock ledger that answers from predefined logs and call results.
///
/// Calls without a registered result revert, which is what a real node
/// reports for a contract that lacks the function.
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    latest_block: u64,
    logs: Vec<LogRecord>,
    calls: HashMap<(Address, Vec<u8>, Option<u64>), Vec<u8>>,
    block_times: HashMap<u64, TimeMs>,
    failing_ranges: Vec<(u64, u64)>,
    unreachable_contracts: HashSet<Address>,
    unreachable: bool,
    logs_disconnected: bool,
    log_queries: Arc<Mutex<Vec<(u64, u64)>>>,
}

impl MockLedger {
    /// Create an empty ledger whose head is block 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latest_block(mut self, block: u64) -> Self {
        self.latest_block = block;
        self
    }

    /// Add a log to the mock ledger.
    pub fn with_log(mut self, log: LogRecord) -> Self {
        self.latest_block = self.latest_block.max(log.block_number);
        self.logs.push(log);
        self
    }

    /// Add multiple logs to the mock ledger.
    pub fn with_logs(mut self, logs: Vec<LogRecord>) -> Self {
        for log in logs {
            self = self.with_log(log);
        }
        self
    }

    /// Register the return data of a call at the latest block.
    pub fn with_call<C: SolCall>(self, to: Address, call: C, ret: Vec<u8>) -> Self {
        self.with_calldata(to, call.abi_encode(), None, ret)
    }

    /// Register the return data for exact calldata, optionally at a past block.
    pub fn with_calldata(
        mut self,
        to: Address,
        calldata: Vec<u8>,
        block: Option<u64>,
        ret: Vec<u8>,
    ) -> Self {
        self.calls.insert((to, calldata, block), ret);
        self
    }

    pub fn with_block_time(mut self, block: u64, time: TimeMs) -> Self {
        self.block_times.insert(block, time);
        self
    }

    /// Any `get_logs` whose range intersects `[from, to]` fails with a node error.
    pub fn with_failing_range(mut self, from: u64, to: u64) -> Self {
        self.failing_ranges.push((from, to));
        self
    }

    /// `get_logs` cannot reach the endpoint; other requests still succeed.
    pub fn with_logs_disconnected(mut self) -> Self {
        self.logs_disconnected = true;
        self
    }

    /// Calls to this contract fail at the transport level.
    pub fn with_unreachable_contract(mut self, address: Address) -> Self {
        self.unreachable_contracts.insert(address);
        self
    }

    /// Every request fails, as if the endpoint were down.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Ranges passed to `get_logs` so far, in call order.
    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        self.log_queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    fn check_reachable(&self) -> Result<(), LedgerError> {
        if self.unreachable {
            return Err(LedgerError::NetworkError("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn latest_block(&self) -> Result<u64, LedgerError> {
        self.check_reachable()?;
        Ok(self.latest_block)
    }

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogRecord>, LedgerError> {
        if let Ok(mut q) = self.log_queries.lock() {
            q.push((from_block, to_block));
        }
        self.check_reachable()?;
        if self.logs_disconnected {
            return Err(LedgerError::NetworkError("connection reset".to_string()));
        }
        if self
            .failing_ranges
            .iter()
            .any(|(from, to)| from_block <= *to && *from <= to_block)
        {
            return Err(LedgerError::RpcError {
                code: -32000,
                message: "range query failed".to_string(),
            });
        }

        let mut out: Vec<LogRecord> = self
            .logs
            .iter()
            .filter(|l| l.block_number >= from_block && l.block_number <= to_block)
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        out.sort_by_key(LogRecord::chain_position);
        Ok(out)
    }

    async fn call(
        &self,
        to: &Address,
        calldata: &[u8],
        block: Option<u64>,
    ) -> Result<Vec<u8>, LedgerError> {
        self.check_reachable()?;
        if self.unreachable_contracts.contains(to) {
            return Err(LedgerError::Timeout);
        }
        self.calls
            .get(&(*to, calldata.to_vec(), block))
            .cloned()
            .ok_or_else(|| LedgerError::Reverted(format!("no result registered for {}", to)))
    }

    async fn block_timestamp(&self, block: u64) -> Result<TimeMs, LedgerError> {
        self.check_reachable()?;
        Ok(self
            .block_times
            .get(&block)
            .copied()
            .unwrap_or_else(|| TimeMs::from_unix_seconds(1_700_000_000 + block * 2)))
    }
}
