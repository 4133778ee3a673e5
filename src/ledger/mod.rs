//! Ledger access: bounded-range log queries, contract reads and block times.

use crate::domain::{Address, TimeMs, TxHash};
use alloy_primitives::{LogData, B256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use std::fmt;

pub mod abi;
pub mod calls;
pub mod mock;
pub mod rpc;
pub mod scan;

pub use mock::MockLedger;
pub use rpc::JsonRpcLedger;
pub use scan::{ChunkedScanner, ScanConfig, ScanOutcome};

/// Read-only view of the ledger.
///
/// Implementations are not expected to paginate: callers keep every
/// `get_logs` range within the provider's span limit (see [`ChunkedScanner`]).
#[async_trait]
pub trait LedgerClient: Send + Sync + fmt::Debug {
    /// Height of the most recent block.
    async fn latest_block(&self) -> Result<u64, LedgerError>;

    /// Fetch logs matching `filter` in the inclusive range `[from_block, to_block]`.
    ///
    /// # Returns
    /// Logs in chain order (block number, then log index).
    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogRecord>, LedgerError>;

    /// Execute a read-only contract call and return the raw return data.
    ///
    /// # Arguments
    /// * `to` - Contract address
    /// * `calldata` - Selector plus ABI-encoded arguments
    /// * `block` - Historical block to read at, or `None` for the latest state
    async fn call(
        &self,
        to: &Address,
        calldata: &[u8],
        block: Option<u64>,
    ) -> Result<Vec<u8>, LedgerError>;

    /// Wall-clock timestamp of a block.
    async fn block_timestamp(&self, block: u64) -> Result<TimeMs, LedgerError>;
}

/// Log filter: optional emitter, a topic0 OR-set, and optional indexed args.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogFilter {
    pub address: Option<Address>,
    /// Any of these event signatures. Empty matches every event.
    pub topic0: Vec<B256>,
    pub topic1: Option<B256>,
    pub topic2: Option<B256>,
}

impl LogFilter {
    pub fn event(topic: B256) -> Self {
        LogFilter {
            topic0: vec![topic],
            ..Default::default()
        }
    }

    pub fn events(topics: Vec<B256>) -> Self {
        LogFilter {
            topic0: topics,
            ..Default::default()
        }
    }

    pub fn at(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Constrain the first indexed argument to an address.
    pub fn topic1_address(mut self, address: &Address) -> Self {
        self.topic1 = Some(address.into_word());
        self
    }

    /// Constrain the second indexed argument to an address.
    pub fn topic2_address(mut self, address: &Address) -> Self {
        self.topic2 = Some(address.into_word());
        self
    }

    /// Whether a log satisfies this filter.
    pub fn matches(&self, log: &LogRecord) -> bool {
        if let Some(address) = &self.address {
            if &log.address != address {
                return false;
            }
        }
        if !self.topic0.is_empty() {
            match log.topics().first() {
                Some(t) if self.topic0.contains(t) => {}
                _ => return false,
            }
        }
        let topic_ok = |want: &Option<B256>, idx: usize| match want {
            Some(w) => log.topics().get(idx) == Some(w),
            None => true,
        };
        topic_ok(&self.topic1, 1) && topic_ok(&self.topic2, 2)
    }
}

/// A single emitted log, positioned in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub address: Address,
    pub data: LogData,
    pub block_number: u64,
    pub transaction_hash: TxHash,
    pub log_index: u64,
}

impl LogRecord {
    pub fn topics(&self) -> &[B256] {
        self.data.topics()
    }

    /// Whether this log carries event `E`'s signature.
    pub fn is<E: SolEvent>(&self) -> bool {
        self.topics().first() == Some(&E::SIGNATURE_HASH)
    }

    /// Decode as event `E`; a signature or layout mismatch is `Undecodable`.
    pub fn decode<E: SolEvent>(&self) -> Result<E, LedgerError> {
        E::decode_log_data(&self.data)
            .map_err(|e| LedgerError::Undecodable(format!("{}: {}", E::SIGNATURE, e)))
    }

    pub fn chain_position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// Error type for ledger operations.
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Network error (e.g., connection refused, DNS failure)
    NetworkError(String),
    /// HTTP error from the RPC endpoint
    HttpError { status: u16, message: String },
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// The call executed and reverted (contract lacks the function, or it failed)
    Reverted(String),
    /// Call returned data that is not a valid encoding of the expected type
    /// (e.g. empty return from an account without code)
    Undecodable(String),
    /// RPC response could not be parsed
    ParseError(String),
    /// Request exceeded its deadline
    Timeout,
    /// Rate limit exceeded
    RateLimited,
}

impl LedgerError {
    /// True when the contract itself rejected the call, as opposed to the
    /// transport failing. Used to tell "not a pool" from "couldn't ask".
    pub fn is_revert(&self) -> bool {
        matches!(self, LedgerError::Reverted(_) | LedgerError::Undecodable(_))
    }

    /// True when the endpoint could not be reached at all, as opposed to
    /// answering with an error.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, LedgerError::NetworkError(_) | LedgerError::Timeout)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LedgerError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            LedgerError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            LedgerError::Reverted(msg) => write!(f, "Execution reverted: {}", msg),
            LedgerError::Undecodable(msg) => write!(f, "Undecodable return data: {}", msg),
            LedgerError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LedgerError::Timeout => write!(f, "Request timed out"),
            LedgerError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::abi::IUniswapV2Pair::Transfer;
    use super::*;
    use alloy_primitives::{Bytes, U256};

    fn transfer(address: Address, from: Address, to: Address) -> LogRecord {
        let event = Transfer {
            from,
            to,
            value: U256::from(7u64),
        };
        LogRecord {
            address,
            data: event.encode_log_data(),
            block_number: 1,
            transaction_hash: TxHash::ZERO,
            log_index: 0,
        }
    }

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::NetworkError("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");

        let err = LedgerError::RpcError {
            code: -32005,
            message: "query returned more than 10000 results".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RPC error -32005: query returned more than 10000 results"
        );

        assert_eq!(LedgerError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_error_classification() {
        assert!(LedgerError::Reverted("".to_string()).is_revert());
        assert!(LedgerError::Undecodable("empty return".to_string()).is_revert());
        assert!(!LedgerError::ParseError("bad json".to_string()).is_revert());
        assert!(!LedgerError::Timeout.is_revert());
        assert!(!LedgerError::NetworkError("x".to_string()).is_revert());

        assert!(LedgerError::Timeout.is_connectivity());
        assert!(LedgerError::NetworkError("x".to_string()).is_connectivity());
        assert!(!LedgerError::RateLimited.is_connectivity());
        assert!(!LedgerError::RpcError { code: -32000, message: String::new() }.is_connectivity());
    }

    #[test]
    fn test_filter_matches_indexed_args() {
        let pool = Address::repeat_byte(1);
        let wallet = Address::repeat_byte(2);
        let other = Address::repeat_byte(3);
        let to_wallet = transfer(pool, other, wallet);
        let from_wallet = transfer(pool, wallet, other);

        let inbound = LogFilter::event(Transfer::SIGNATURE_HASH).topic2_address(&wallet);
        assert!(inbound.matches(&to_wallet));
        assert!(!inbound.matches(&from_wallet));

        let outbound = LogFilter::event(Transfer::SIGNATURE_HASH)
            .at(pool)
            .topic1_address(&wallet);
        assert!(outbound.matches(&from_wallet));
        assert!(!outbound.clone().at(other).matches(&from_wallet));
    }

    #[test]
    fn test_decode_checks_signature() {
        let log = transfer(Address::repeat_byte(1), Address::ZERO, Address::repeat_byte(2));
        assert!(log.is::<Transfer>());
        let decoded = log.decode::<Transfer>().unwrap();
        assert_eq!(decoded.to, Address::repeat_byte(2));
        assert_eq!(decoded.value, U256::from(7u64));

        assert!(!log.is::<abi::IUniswapV2Pair::Mint>());
        assert!(log.decode::<abi::IUniswapV2Pair::Mint>().is_err());

        let bare = LogRecord {
            data: LogData::new_unchecked(vec![Transfer::SIGNATURE_HASH], Bytes::new()),
            ..log
        };
        assert!(bare.decode::<Transfer>().unwrap_err().is_revert());
    }
}
