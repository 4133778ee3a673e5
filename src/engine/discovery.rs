//! Position discovery: candidate pools from inbound share transfers, a
//! capability probe per candidate, then live balance and reserves.

use crate::domain::{Address, LpPosition, Pool};
use crate::ledger::abi::IUniswapV2Pair::Transfer;
use crate::ledger::{calls, ChunkedScanner, LedgerClient, LedgerError, LogFilter, ScanConfig};
use alloy_sol_types::SolEvent;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Result of asking a contract whether it behaves like a two-asset pair.
///
/// This is a heuristic: any contract that happens to answer `token0()` and
/// `token1()` with addresses is treated as a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolProbe {
    Confirmed { token0: Address, token1: Address },
    /// The contract rejected an identity read.
    Rejected,
    /// The reads could not be completed; nothing is known either way.
    Indeterminate,
}

/// Probe `candidate` for the two pair-identity reads.
pub async fn probe_pool(ledger: &dyn LedgerClient, candidate: &Address) -> PoolProbe {
    let (token0, token1) = tokio::join!(
        calls::token0(ledger, candidate),
        calls::token1(ledger, candidate)
    );
    match (token0, token1) {
        (Ok(token0), Ok(token1)) => PoolProbe::Confirmed { token0, token1 },
        (Err(e), _) | (_, Err(e)) if e.is_revert() => PoolProbe::Rejected,
        _ => PoolProbe::Indeterminate,
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Could not determine whether {0} is a pool")]
    Indeterminate(Address),
}

/// Finds a wallet's open LP positions.
#[derive(Debug, Clone)]
pub struct PositionDiscovery {
    ledger: Arc<dyn LedgerClient>,
    scanner: ChunkedScanner,
}

impl PositionDiscovery {
    pub fn new(ledger: Arc<dyn LedgerClient>, scan_config: ScanConfig) -> Self {
        let scanner = ChunkedScanner::new(ledger.clone(), scan_config);
        Self { ledger, scanner }
    }

    /// Discover open positions for `wallet`.
    ///
    /// Best-effort: only pools that sent the wallet shares inside the scan
    /// window are considered, and a failure on one candidate drops that
    /// candidate alone. Output order is unspecified.
    pub async fn discover_positions(
        &self,
        wallet: &Address,
    ) -> Result<Vec<LpPosition>, DiscoveryError> {
        let filter = LogFilter::event(Transfer::SIGNATURE_HASH).topic2_address(wallet);
        let outcome = self.scanner.scan(&filter).await?;

        let candidates: BTreeSet<Address> = outcome.logs.iter().map(|l| l.address).collect();
        info!(
            wallet = %wallet,
            candidates = candidates.len(),
            lowest_block = outcome.lowest_block_scanned,
            "Discovered candidate pools"
        );

        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let ledger = self.ledger.clone();
            let wallet = *wallet;
            tasks.spawn(async move {
                (
                    candidate,
                    read_position(ledger.as_ref(), candidate, wallet).await,
                )
            });
        }

        let mut positions = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Some(position)))) => positions.push(position),
                Ok((candidate, Ok(None))) => {
                    debug!(candidate = %candidate, "Candidate is not an open position");
                }
                Ok((candidate, Err(DiscoveryError::Indeterminate(_)))) => {
                    warn!(candidate = %candidate, "Pool probe indeterminate, excluding candidate");
                }
                Ok((candidate, Err(e))) => {
                    warn!(candidate = %candidate, error = %e, "Candidate read failed, excluding");
                }
                Err(e) => warn!(error = %e, "Candidate task aborted"),
            }
        }
        Ok(positions)
    }

    /// Load the live position for one known pool without rescanning.
    ///
    /// `Ok(None)` when the contract is not a pool or the balance is zero.
    pub async fn load_position(
        &self,
        pool: &Address,
        wallet: &Address,
    ) -> Result<Option<LpPosition>, DiscoveryError> {
        read_position(self.ledger.as_ref(), *pool, *wallet).await
    }
}

/// Probe, balance check, then reserves, supply and token metadata.
async fn read_position(
    ledger: &dyn LedgerClient,
    pool: Address,
    wallet: Address,
) -> Result<Option<LpPosition>, DiscoveryError> {
    let (token0, token1) = match probe_pool(ledger, &pool).await {
        PoolProbe::Confirmed { token0, token1 } => (token0, token1),
        PoolProbe::Rejected => {
            debug!(candidate = %pool, "Candidate rejected identity reads");
            return Ok(None);
        }
        PoolProbe::Indeterminate => return Err(DiscoveryError::Indeterminate(pool)),
    };

    let balance = calls::balance_of(ledger, &pool, &wallet).await?;
    if balance.is_zero() {
        return Ok(None);
    }

    let (reserves, total_supply, meta0, meta1) = tokio::join!(
        calls::reserves(ledger, &pool),
        calls::total_supply(ledger, &pool, None),
        calls::token_metadata(ledger, token0),
        calls::token_metadata(ledger, token1),
    );
    let (reserve0_raw, reserve1_raw) = reserves?;

    let pool = Pool {
        address: pool,
        token0: meta0,
        token1: meta1,
        reserve0_raw,
        reserve1_raw,
        total_supply_raw: total_supply?,
    };
    Ok(Some(LpPosition::new(pool, wallet, balance)))
}
