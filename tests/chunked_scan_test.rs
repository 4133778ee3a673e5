mod common;

use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use common::*;
use lplens::domain::{Address, TimeMs};
use lplens::ledger::abi::IUniswapV2Pair::Transfer;
use lplens::ledger::{
    ChunkedScanner, LedgerClient, LedgerError, LogFilter, LogRecord, MockLedger, ScanConfig,
};
use std::sync::Arc;
use std::time::Duration;

fn config(chunk_size: u64, max_chunks: u32) -> ScanConfig {
    ScanConfig {
        chunk_size,
        max_chunks,
        request_timeout: Duration::from_secs(5),
    }
}

fn inbound(wallet: &Address) -> LogFilter {
    LogFilter::event(Transfer::SIGNATURE_HASH).topic2_address(wallet)
}

fn credit(block: u64, log_index: u64) -> LogRecord {
    transfer_log(
        addr(POOL),
        Address::ZERO,
        addr(WALLET),
        units(1, 18),
        block,
        block as u8,
        log_index,
    )
}

#[tokio::test]
async fn test_activity_beyond_max_chunks_is_not_found() {
    let ledger = MockLedger::new()
        .with_log(credit(5, 0))
        .with_latest_block(999);
    let scanner = ChunkedScanner::new(Arc::new(ledger.clone()), config(100, 3));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();

    assert!(outcome.logs.is_empty());
    assert_eq!(outcome.chunks_queried, 3);
    assert_eq!(outcome.lowest_block_scanned, 700);
    assert_eq!(ledger.log_queries(), vec![(900, 999), (800, 899), (700, 799)]);
}

#[tokio::test]
async fn test_scan_stops_at_first_matching_chunk() {
    let ledger = MockLedger::new()
        .with_log(credit(850, 0))
        .with_log(credit(820, 3))
        .with_log(credit(50, 0))
        .with_latest_block(999);
    let scanner = ChunkedScanner::new(Arc::new(ledger.clone()), config(100, 10));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();

    assert!(outcome.stopped_on_match);
    assert_eq!(ledger.log_queries(), vec![(900, 999), (800, 899)]);
    let blocks: Vec<u64> = outcome.logs.iter().map(|l| l.block_number).collect();
    assert_eq!(blocks, vec![820, 850]);
}

#[tokio::test]
async fn test_match_in_head_chunk_queries_once() {
    let ledger = MockLedger::new().with_log(credit(990, 0));
    let scanner = ChunkedScanner::new(Arc::new(ledger.clone()), config(100, 10));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();

    assert_eq!(outcome.logs.len(), 1);
    assert_eq!(ledger.log_queries().len(), 1);
}

#[tokio::test]
async fn test_filter_excludes_other_wallets() {
    let other = transfer_log(addr(POOL), Address::ZERO, addr(0x02), units(1, 18), 950, 9, 0);
    let ledger = MockLedger::new().with_log(other).with_latest_block(999);
    let scanner = ChunkedScanner::new(Arc::new(ledger), config(100, 2));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();
    assert!(outcome.logs.is_empty());
    assert!(!outcome.stopped_on_match);
}

#[tokio::test]
async fn test_failed_chunk_counts_as_empty_and_scan_continues() {
    let ledger = MockLedger::new()
        .with_log(credit(950, 0))
        .with_log(credit(850, 0))
        .with_latest_block(999)
        .with_failing_range(900, 999);
    let scanner = ChunkedScanner::new(Arc::new(ledger), config(100, 10));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();

    assert_eq!(outcome.chunks_failed, 1);
    assert_eq!(outcome.chunks_queried, 2);
    let blocks: Vec<u64> = outcome.logs.iter().map(|l| l.block_number).collect();
    assert_eq!(blocks, vec![850]);
}

/// Ledger whose log queries over a given range never finish.
#[derive(Debug)]
struct StallingLedger {
    inner: MockLedger,
    stall_from: u64,
}

#[async_trait]
impl LedgerClient for StallingLedger {
    async fn latest_block(&self) -> Result<u64, LedgerError> {
        self.inner.latest_block().await
    }

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogRecord>, LedgerError> {
        if to_block >= self.stall_from {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.get_logs(filter, from_block, to_block).await
    }

    async fn call(
        &self,
        to: &Address,
        calldata: &[u8],
        block: Option<u64>,
    ) -> Result<Vec<u8>, LedgerError> {
        self.inner.call(to, calldata, block).await
    }

    async fn block_timestamp(&self, block: u64) -> Result<TimeMs, LedgerError> {
        self.inner.block_timestamp(block).await
    }
}

#[tokio::test]
async fn test_hung_chunk_times_out_and_is_skipped() {
    let ledger = StallingLedger {
        inner: MockLedger::new().with_log(credit(850, 0)).with_latest_block(999),
        stall_from: 900,
    };
    let scanner = ChunkedScanner::new(
        Arc::new(ledger),
        ScanConfig {
            chunk_size: 100,
            max_chunks: 10,
            request_timeout: Duration::from_millis(20),
        },
    );

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();

    assert_eq!(outcome.chunks_failed, 1);
    assert_eq!(outcome.logs.len(), 1);
}

#[tokio::test]
async fn test_total_outage_is_fatal() {
    let ledger = MockLedger::new()
        .with_latest_block(299)
        .with_logs_disconnected();
    let scanner = ChunkedScanner::new(Arc::new(ledger), config(100, 10));

    let err = scanner.scan(&inbound(&addr(WALLET))).await.unwrap_err();
    assert!(matches!(err, LedgerError::NetworkError(_)));
}

#[tokio::test]
async fn test_short_chain_with_failed_window_is_partial_not_fatal() {
    let ledger = MockLedger::new()
        .with_latest_block(300)
        .with_failing_range(0, 300);
    let scanner = ChunkedScanner::new(Arc::new(ledger.clone()), config(1_000, 10));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();

    assert_eq!(ledger.log_queries(), vec![(0, 300)]);
    assert_eq!(outcome.chunks_queried, 1);
    assert_eq!(outcome.chunks_failed, 1);
    assert!(outcome.logs.is_empty());
}

#[tokio::test]
async fn test_single_window_budget_with_failure_is_partial() {
    let ledger = MockLedger::new()
        .with_latest_block(999)
        .with_failing_range(900, 999);
    let scanner = ChunkedScanner::new(Arc::new(ledger), config(100, 1));

    let outcome = scanner.scan(&inbound(&addr(WALLET))).await.unwrap();
    assert_eq!((outcome.chunks_queried, outcome.chunks_failed), (1, 1));
    assert_eq!(outcome.lowest_block_scanned, 900);
}
