//! Mock price feed for testing without network calls.

use super::{HistoricalQuote, PriceError, PriceFeed, PriceQuote};
use crate::domain::Address;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct MockPriceFeed {
    current: HashMap<Address, f64>,
    historical: HashMap<(Address, i64), f64>,
    failing_timestamps: HashSet<i64>,
    unreachable: bool,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, token: Address, price: f64) -> Self {
        self.current.insert(token, price);
        self
    }

    pub fn with_historical(mut self, token: Address, unix_seconds: i64, price: f64) -> Self {
        self.historical.insert((token, unix_seconds), price);
        self
    }

    /// Historical lookups at this timestamp fail.
    pub fn with_failing_timestamp(mut self, unix_seconds: i64) -> Self {
        self.failing_timestamps.insert(unix_seconds);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn current_prices(
        &self,
        tokens: &[Address],
    ) -> Result<HashMap<Address, PriceQuote>, PriceError> {
        if self.unreachable {
            return Err(PriceError::Network("connection refused".to_string()));
        }
        Ok(tokens
            .iter()
            .filter_map(|t| {
                self.current.get(t).map(|p| {
                    (
                        *t,
                        PriceQuote {
                            price: *p,
                            symbol: None,
                            decimals: None,
                            confidence: None,
                        },
                    )
                })
            })
            .collect())
    }

    async fn historical_price(
        &self,
        token: &Address,
        unix_seconds: i64,
    ) -> Result<Option<HistoricalQuote>, PriceError> {
        if self.unreachable || self.failing_timestamps.contains(&unix_seconds) {
            return Err(PriceError::Http(502));
        }
        Ok(self
            .historical
            .get(&(*token, unix_seconds))
            .map(|p| HistoricalQuote {
                price: *p,
                symbol: None,
                timestamp: Some(unix_seconds),
            }))
    }
}
