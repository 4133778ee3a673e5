//! Domain primitives: TimeMs plus the ledger's Address and TxHash.

pub use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Create a TimeMs from a block timestamp in seconds.
    pub fn from_unix_seconds(secs: u64) -> Self {
        TimeMs(i64::try_from(secs).unwrap_or(i64::MAX / 1000).saturating_mul(1000))
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Whole seconds since Unix epoch (the unit price oracles key on).
    pub fn as_unix_seconds(&self) -> i64 {
        self.0.div_euclid(1000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 20 bytes, got {0} hex chars")]
    BadLength(usize),
    #[error("address contains non-hex characters")]
    NotHex,
}

/// Strict user-input parsing: `0x` followed by exactly 40 hex characters,
/// in any case. Checksums are not enforced.
pub fn parse_address(s: &str) -> Result<Address, AddressParseError> {
    let s = s.trim();
    let hex_part = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(AddressParseError::MissingPrefix)?;
    if hex_part.len() != 40 {
        return Err(AddressParseError::BadLength(hex_part.len()));
    }
    Address::from_str(hex_part).map_err(|_| AddressParseError::NotHex)
}
