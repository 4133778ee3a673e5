//! JSON-RPC ledger client.

use super::{LedgerClient, LedgerError, LogFilter, LogRecord};
use crate::domain::{Address, TimeMs};
use alloy_primitives::{Bytes, U64};
use alloy_rpc_types::{BlockNumberOrTag, Filter, Log};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Ledger client speaking the standard Ethereum JSON-RPC methods.
#[derive(Debug, Clone)]
pub struct JsonRpcLedger {
    client: Client,
    url: String,
    retry_max_elapsed: Duration,
}

impl JsonRpcLedger {
    /// Create a client with a per-request timeout and a retry budget for
    /// transient failures.
    pub fn new(
        url: String,
        request_timeout: Duration,
        retry_max_elapsed: Duration,
    ) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LedgerError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            url,
            retry_max_elapsed,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        let body = retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        backoff::Error::transient(LedgerError::Timeout)
                    } else {
                        backoff::Error::transient(LedgerError::NetworkError(e.to_string()))
                    }
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(LedgerError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(LedgerError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(LedgerError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(LedgerError::ParseError(e.to_string())))
        })
        .await?;

        parse_rpc_body(body)
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn latest_block(&self) -> Result<u64, LedgerError> {
        let n: U64 = decode(self.rpc("eth_blockNumber", json!([])).await?)?;
        Ok(n.to::<u64>())
    }

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogRecord>, LedgerError> {
        debug!(from_block, to_block, "eth_getLogs");
        let result = self
            .rpc("eth_getLogs", json!([rpc_filter(filter, from_block, to_block)]))
            .await?;
        let logs: Vec<Log> = decode(result)?;

        let mut out = logs
            .into_iter()
            .map(into_record)
            .collect::<Result<Vec<_>, _>>()?;
        out.sort_by_key(LogRecord::chain_position);
        Ok(out)
    }

    async fn call(
        &self,
        to: &Address,
        calldata: &[u8],
        block: Option<u64>,
    ) -> Result<Vec<u8>, LedgerError> {
        let tag = block.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);
        let request = json!({ "to": to, "data": Bytes::copy_from_slice(calldata) });
        let data: Bytes = decode(self.rpc("eth_call", json!([request, tag])).await?)?;
        Ok(data.to_vec())
    }

    async fn block_timestamp(&self, block: u64) -> Result<TimeMs, LedgerError> {
        let result = self
            .rpc("eth_getBlockByNumber", json!([BlockNumberOrTag::Number(block), false]))
            .await?;
        let header: Option<BlockTimestamp> = decode(result)?;
        let header =
            header.ok_or_else(|| LedgerError::ParseError(format!("Block {} not found", block)))?;
        Ok(TimeMs::from_unix_seconds(header.timestamp.to::<u64>()))
    }
}

#[derive(Deserialize)]
struct BlockTimestamp {
    timestamp: U64,
}

fn rpc_filter(filter: &LogFilter, from_block: u64, to_block: u64) -> Filter {
    let mut out = Filter::new()
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(filter.topic0.clone());
    if let Some(address) = filter.address {
        out = out.address(address);
    }
    if let Some(t) = filter.topic1 {
        out = out.topic1(t);
    }
    if let Some(t) = filter.topic2 {
        out = out.topic2(t);
    }
    out
}

/// Unwrap a JSON-RPC envelope into its `result`, classifying node errors.
fn parse_rpc_body(body: Value) -> Result<Value, LedgerError> {
    if let Some(err) = body.get("error") {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        if code == 3 || message.to_ascii_lowercase().contains("revert") {
            return Err(LedgerError::Reverted(message));
        }
        return Err(LedgerError::RpcError { code, message });
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| LedgerError::ParseError("Missing result field".to_string()))
}

fn decode<T: DeserializeOwned>(result: Value) -> Result<T, LedgerError> {
    serde_json::from_value(result).map_err(|e| LedgerError::ParseError(e.to_string()))
}

/// Pending logs have no chain position and are rejected.
fn into_record(log: Log) -> Result<LogRecord, LedgerError> {
    let missing = |field: &str| LedgerError::ParseError(format!("Log without {}", field));
    Ok(LogRecord {
        block_number: log.block_number.ok_or_else(|| missing("blockNumber"))?,
        transaction_hash: log.transaction_hash.ok_or_else(|| missing("transactionHash"))?,
        log_index: log.log_index.ok_or_else(|| missing("logIndex"))?,
        address: log.inner.address,
        data: log.inner.data,
    })
}
