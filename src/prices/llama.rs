//! DefiLlama coins API client.

use super::{HistoricalQuote, PriceError, PriceFeed, PriceQuote};
use crate::domain::Address;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CoinsResponse {
    #[serde(default)]
    coins: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    price: f64,
    symbol: Option<String>,
    decimals: Option<u8>,
    timestamp: Option<i64>,
    confidence: Option<f64>,
}

/// Price feed backed by `coins.llama.fi`-style endpoints.
#[derive(Debug, Clone)]
pub struct LlamaPriceFeed {
    client: Client,
    base_url: String,
    chain: String,
    retry_max_elapsed: Duration,
}

impl LlamaPriceFeed {
    pub fn new(
        base_url: String,
        chain: String,
        request_timeout: Duration,
        retry_max_elapsed: Duration,
    ) -> Result<Self, PriceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PriceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            chain,
            retry_max_elapsed,
        })
    }

    fn coin_key(&self, token: &Address) -> String {
        format!("{}:{:#x}", self.chain, token)
    }

    async fn get_coins(&self, url: String) -> Result<CoinsResponse, PriceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(PriceError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(PriceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(PriceError::Http(status.as_u16())));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(PriceError::Http(status.as_u16())));
            }

            response
                .json::<CoinsResponse>()
                .await
                .map_err(|e| backoff::Error::permanent(PriceError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceFeed for LlamaPriceFeed {
    async fn current_prices(
        &self,
        tokens: &[Address],
    ) -> Result<HashMap<Address, PriceQuote>, PriceError> {
        if tokens.is_empty() {
            return Ok(HashMap::new());
        }
        let coins = tokens
            .iter()
            .map(|t| self.coin_key(t))
            .collect::<Vec<_>>()
            .join(",");
        debug!(coins = %coins, "Fetching current prices");

        let body = self
            .get_coins(format!("{}/prices/current/{}", self.base_url, coins))
            .await?;
        Ok(parse_current(body))
    }

    async fn historical_price(
        &self,
        token: &Address,
        unix_seconds: i64,
    ) -> Result<Option<HistoricalQuote>, PriceError> {
        let key = self.coin_key(token);
        let mut body = self
            .get_coins(format!(
                "{}/prices/historical/{}/{}",
                self.base_url, unix_seconds, key
            ))
            .await?;

        Ok(body.coins.remove(&key).map(|c| HistoricalQuote {
            price: c.price,
            symbol: c.symbol,
            timestamp: c.timestamp,
        }))
    }
}

/// Key the response by token address; keys look like `chain:0xabc...`.
fn parse_current(body: CoinsResponse) -> HashMap<Address, PriceQuote> {
    let mut out = HashMap::new();
    for (key, entry) in body.coins {
        let Some(address) = key
            .split_once(':')
            .and_then(|(_, addr)| Address::from_str(addr).ok())
        else {
            warn!(key = %key, "Skipping price entry with unparseable key");
            continue;
        };
        out.insert(
            address,
            PriceQuote {
                price: entry.price,
                symbol: entry.symbol,
                decimals: entry.decimals,
                confidence: entry.confidence,
            },
        );
    }
    out
}
