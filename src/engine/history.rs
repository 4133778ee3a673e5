//! History reconstruction for one pool/wallet pair.
//!
//! Share transfers into and out of the wallet are scanned concurrently,
//! merged, and each one is paired with the pool state of its block: the
//! reserve update, the pool's own Mint/Burn body when the same transaction
//! carries one, the block time, and the share supply at that block.

use crate::domain::units::{format_units, LP_SHARE_DECIMALS};
use crate::domain::{
    Address, AmountSource, HistoryOutcome, LiquidityEvent, LiquidityEventKind, PositionHistory,
    ReserveSnapshot, TimeMs, Token,
};
use crate::ledger::abi::IUniswapV2Pair::{Burn, Mint, Sync as SyncEvent, Transfer};
use crate::ledger::{
    calls, ChunkedScanner, LedgerClient, LedgerError, LogFilter, LogRecord, ScanConfig,
    ScanOutcome,
};
use alloy_primitives::U256;
use alloy_sol_types::SolEvent;
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0} does not implement the pair interface")]
    NotAPool(Address),
}

/// Pool state observed in a single block. Every field is best-effort.
#[derive(Debug, Clone, Default)]
struct BlockContext {
    timestamp: Option<TimeMs>,
    /// Sync, Mint and Burn logs emitted by the pool in this block.
    pool_logs: Option<Vec<LogRecord>>,
    total_supply: Option<U256>,
}

#[derive(Debug, Clone)]
pub struct HistoryReconstructor {
    ledger: Arc<dyn LedgerClient>,
    scanner: ChunkedScanner,
    request_timeout: Duration,
}

impl HistoryReconstructor {
    pub fn new(ledger: Arc<dyn LedgerClient>, scan_config: ScanConfig) -> Self {
        let scanner = ChunkedScanner::new(ledger.clone(), scan_config);
        Self {
            ledger,
            scanner,
            request_timeout: scan_config.request_timeout,
        }
    }

    /// Rebuild the ordered add/remove timeline of `wallet` in `pool`.
    ///
    /// Returns [`HistoryOutcome::NoHistoryFound`] when neither scan found a
    /// transfer, which only says the scan window held nothing.
    pub async fn reconstruct_history(
        &self,
        pool: &Address,
        wallet: &Address,
    ) -> Result<HistoryOutcome, HistoryError> {
        let transfers = LogFilter::event(Transfer::SIGNATURE_HASH).at(*pool);
        let inbound_filter = transfers.clone().topic2_address(wallet);
        let outbound_filter = transfers.topic1_address(wallet);
        let (inbound, outbound) = tokio::join!(
            self.scanner.scan(&inbound_filter),
            self.scanner.scan(&outbound_filter),
        );
        let (inbound, outbound) = one_sided(inbound, outbound)?;
        let scanned = inbound.summary().merge(outbound.summary());

        let mut seen = HashSet::new();
        let logs: Vec<LogRecord> = inbound
            .logs
            .into_iter()
            .chain(outbound.logs)
            .filter(|l| seen.insert((l.transaction_hash, l.log_index)))
            .filter(|l| !is_self_transfer(l, wallet))
            .collect();

        if logs.is_empty() {
            info!(pool = %pool, wallet = %wallet, "No share transfers in scan window");
            return Ok(HistoryOutcome::NoHistoryFound { scanned });
        }

        let (token0, token1) = self.pool_tokens(pool).await?;
        let current_supply = calls::total_supply(self.ledger.as_ref(), pool, None)
            .await
            .map_err(|e| warn!(pool = %pool, error = %e, "Current total supply unavailable"))
            .ok();

        let blocks: BTreeSet<u64> = logs.iter().map(|l| l.block_number).collect();
        let contexts = self.block_contexts(pool, blocks).await;

        let events = logs
            .iter()
            .filter_map(|log| {
                let ctx = contexts.get(&log.block_number).cloned().unwrap_or_default();
                build_event(log, wallet, &ctx, current_supply, &token0, &token1)
            })
            .collect();

        Ok(HistoryOutcome::Found(PositionHistory::new(
            *pool, *wallet, token0, token1, events, scanned,
        )))
    }

    async fn pool_tokens(&self, pool: &Address) -> Result<(Token, Token), HistoryError> {
        let ledger = self.ledger.as_ref();
        let (token0, token1) = tokio::join!(calls::token0(ledger, pool), calls::token1(ledger, pool));
        let (token0, token1) = match (token0, token1) {
            (Ok(t0), Ok(t1)) => (t0, t1),
            (Err(e), _) | (_, Err(e)) => {
                return Err(if e.is_revert() {
                    HistoryError::NotAPool(*pool)
                } else {
                    HistoryError::Ledger(e)
                })
            }
        };
        Ok(tokio::join!(
            calls::token_metadata(ledger, token0),
            calls::token_metadata(ledger, token1)
        ))
    }

    /// Per-block reads, all issued at once. A failed read leaves its field empty.
    async fn block_contexts(
        &self,
        pool: &Address,
        blocks: BTreeSet<u64>,
    ) -> BTreeMap<u64, BlockContext> {
        let pool_events = LogFilter::events(vec![
            SyncEvent::SIGNATURE_HASH,
            Mint::SIGNATURE_HASH,
            Burn::SIGNATURE_HASH,
        ])
        .at(*pool);
        let ledger = self.ledger.as_ref();

        let reads = blocks.into_iter().map(|block| {
            let pool_events = &pool_events;
            async move {
                let (timestamp, pool_logs, total_supply) = tokio::join!(
                    self.bounded("block timestamp", block, ledger.block_timestamp(block)),
                    self.bounded("pool events", block, ledger.get_logs(pool_events, block, block)),
                    self.bounded(
                        "historical total supply",
                        block,
                        calls::total_supply(ledger, pool, Some(block))
                    ),
                );
                (
                    block,
                    BlockContext {
                        timestamp,
                        pool_logs,
                        total_supply,
                    },
                )
            }
        });
        join_all(reads).await.into_iter().collect()
    }

    async fn bounded<T>(
        &self,
        what: &'static str,
        block: u64,
        read: impl Future<Output = Result<T, LedgerError>>,
    ) -> Option<T> {
        let result = match tokio::time::timeout(self.request_timeout, read).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout),
        };
        result
            .map_err(|e| debug!(block, read = what, error = %e, "Block read failed"))
            .ok()
    }
}

/// Keep whichever transfer scan succeeded. When both fail, or one fails and
/// the other found nothing, the failure is returned: an empty result would
/// otherwise read as "no history".
fn one_sided(
    inbound: Result<ScanOutcome, LedgerError>,
    outbound: Result<ScanOutcome, LedgerError>,
) -> Result<(ScanOutcome, ScanOutcome), LedgerError> {
    match (inbound, outbound) {
        (Ok(i), Ok(o)) => Ok((i, o)),
        (Ok(found), Err(e)) | (Err(e), Ok(found)) if !found.logs.is_empty() => {
            warn!(error = %e, "One transfer direction could not be scanned, keeping the other");
            let failed = ScanOutcome {
                chunks_queried: 1,
                chunks_failed: 1,
                lowest_block_scanned: found.lowest_block_scanned,
                ..Default::default()
            };
            Ok((found, failed))
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

fn is_self_transfer(log: &LogRecord, wallet: &Address) -> bool {
    log.decode::<Transfer>()
        .map(|t| t.from == *wallet && t.to == *wallet)
        .unwrap_or(false)
}

/// Turn one share transfer into a liquidity event, or `None` if its value
/// word is unreadable.
fn build_event(
    log: &LogRecord,
    wallet: &Address,
    ctx: &BlockContext,
    current_supply: Option<U256>,
    token0: &Token,
    token1: &Token,
) -> Option<LiquidityEvent> {
    let transfer = match log.decode::<Transfer>() {
        Ok(t) => t,
        Err(e) => {
            warn!(tx = %log.transaction_hash, error = %e, "Skipping undecodable transfer");
            return None;
        }
    };
    let kind = if transfer.to == *wallet {
        LiquidityEventKind::Add
    } else {
        LiquidityEventKind::Remove
    };
    let pool_logs = ctx.pool_logs.as_deref().unwrap_or_default();

    let reserves = match_sync(pool_logs, log).and_then(|(sync, same_transaction)| {
        let sync = sync.decode::<SyncEvent>().ok()?;
        Some(ReserveSnapshot {
            reserve0: format_units(U256::from(sync.reserve0), token0.decimals),
            reserve1: format_units(U256::from(sync.reserve1), token1.decimals),
            same_transaction,
        })
    });

    let lp_amount = format_units(transfer.value, LP_SHARE_DECIMALS);
    let native = pool_logs
        .iter()
        .filter(|l| l.transaction_hash == log.transaction_hash)
        .find_map(|l| {
            let (amount0, amount1) = match kind {
                LiquidityEventKind::Add => l.decode::<Mint>().ok().map(|m| (m.amount0, m.amount1))?,
                LiquidityEventKind::Remove => {
                    l.decode::<Burn>().ok().map(|b| (b.amount0, b.amount1))?
                }
            };
            Some((
                format_units(amount0, token0.decimals),
                format_units(amount1, token1.decimals),
            ))
        });

    let supply = ctx
        .total_supply
        .or(current_supply)
        .map(|s| format_units(s, LP_SHARE_DECIMALS))
        .filter(|s| *s > 0.0);

    let (amount0, amount1, amount_source) = match (native, reserves, supply) {
        (Some((a0, a1)), _, _) => (a0, a1, AmountSource::NativeEvent),
        (None, Some(r), Some(supply)) => (
            r.reserve0 * lp_amount / supply,
            r.reserve1 * lp_amount / supply,
            AmountSource::Apportioned,
        ),
        _ => (0.0, 0.0, AmountSource::Unavailable),
    };

    Some(LiquidityEvent {
        kind,
        pool: log.address,
        transaction_hash: log.transaction_hash,
        block_number: log.block_number,
        log_index: log.log_index,
        timestamp: ctx.timestamp,
        lp_amount,
        amount0,
        amount1,
        amount_source,
        k: reserves.map_or(0.0, |r| r.k()),
        reserves,
    })
}

/// The reserve update for `transfer`: the last Sync of its own transaction,
/// else the last Sync of the block.
fn match_sync<'a>(pool_logs: &'a [LogRecord], transfer: &LogRecord) -> Option<(&'a LogRecord, bool)> {
    let syncs = || {
        pool_logs
            .iter()
            .filter(|l| l.is::<SyncEvent>() && l.block_number == transfer.block_number)
    };
    if let Some(sync) = syncs()
        .filter(|l| l.transaction_hash == transfer.transaction_hash)
        .max_by_key(|l| l.log_index)
    {
        return Some((sync, true));
    }
    syncs().max_by_key(|l| l.log_index).map(|s| (s, false))
}
