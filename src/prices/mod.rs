//! Token price lookups against an external oracle.

use crate::domain::Address;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::warn;

pub mod llama;
pub mod mock;

pub use llama::LlamaPriceFeed;
pub use mock::MockPriceFeed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: f64,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQuote {
    pub price: f64,
    pub symbol: Option<String>,
    /// Unix seconds of the oracle's data point, which may differ from the request.
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Error)]
pub enum PriceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {0}")]
    Http(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimited,
}

/// Price oracle.
///
/// A token the oracle does not know is absent from the result, not an error.
#[async_trait]
pub trait PriceFeed: Send + Sync + fmt::Debug {
    /// Latest USD prices for a set of tokens.
    async fn current_prices(
        &self,
        tokens: &[Address],
    ) -> Result<HashMap<Address, PriceQuote>, PriceError>;

    /// Price of a token near a Unix timestamp (seconds).
    async fn historical_price(
        &self,
        token: &Address,
        unix_seconds: i64,
    ) -> Result<Option<HistoricalQuote>, PriceError>;

    /// Prices for one token at many timestamps, fetched concurrently.
    ///
    /// A failed lookup maps to `None` for that timestamp only.
    async fn historical_prices(
        &self,
        token: &Address,
        timestamps: &[i64],
    ) -> BTreeMap<i64, Option<f64>> {
        let lookups = timestamps.iter().map(|ts| async move {
            let price = match self.historical_price(token, *ts).await {
                Ok(quote) => quote.map(|q| q.price),
                Err(e) => {
                    warn!(token = %token, timestamp = ts, error = %e, "Historical price lookup failed");
                    None
                }
            };
            (*ts, price)
        });
        join_all(lookups).await.into_iter().collect()
    }
}
