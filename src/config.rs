use crate::ledger::ScanConfig;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rpc_url: String,
    pub price_api_url: String,
    /// Chain prefix used in price-oracle coin keys, e.g. `base`.
    pub chain: String,
    pub log_chunk_size: u64,
    pub max_log_chunks: u32,
    pub request_timeout_ms: u64,
    pub retry_max_elapsed_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let price_api_url = env_map
            .get("PRICE_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://coins.llama.fi".to_string());

        let chain = env_map
            .get("CHAIN")
            .cloned()
            .unwrap_or_else(|| "base".to_string());
        if chain.is_empty() {
            return Err(ConfigError::InvalidValue(
                "CHAIN".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let log_chunk_size = positive(
            "LOG_CHUNK_SIZE",
            parse_or(&env_map, "LOG_CHUNK_SIZE", 40_000u64, "must be a valid u64")?,
        )?;
        let max_log_chunks = positive(
            "MAX_LOG_CHUNKS",
            parse_or(&env_map, "MAX_LOG_CHUNKS", 10u32, "must be a valid u32")?,
        )?;
        let request_timeout_ms = positive(
            "REQUEST_TIMEOUT_MS",
            parse_or(&env_map, "REQUEST_TIMEOUT_MS", 15_000u64, "must be a valid u64")?,
        )?;
        let retry_max_elapsed_ms = parse_or(
            &env_map,
            "RETRY_MAX_ELAPSED_MS",
            10_000u64,
            "must be a valid u64",
        )?;

        Ok(Config {
            port,
            rpc_url,
            price_api_url,
            chain,
            log_chunk_size,
            max_log_chunks,
            request_timeout_ms,
            retry_max_elapsed_ms,
        })
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            chunk_size: self.log_chunk_size,
            max_chunks: self.max_log_chunks,
            request_timeout: self.request_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_max_elapsed(&self) -> Duration {
        Duration::from_millis(self.retry_max_elapsed_ms)
    }
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
        None => Ok(default),
    }
}

fn positive<T: PartialOrd + Default>(key: &str, value: T) -> Result<T, ConfigError> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ))
    }
}
