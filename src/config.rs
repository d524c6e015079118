use crate::aggregator::QueryLimits;
use crate::error::{ExplorerError, ExplorerResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub helius_api_key: Option<String>,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Signature resolutions allowed in flight at once.
    pub rpc_concurrency: usize,
    pub rpc_max_retries: u32,
    pub rpc_timeout: Duration,
    pub request_timeout: Duration,
    pub limits: QueryLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            helius_api_key: None,
            redis_url: None,
            database_url: None,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            rpc_concurrency: 10,
            rpc_max_retries: 3,
            rpc_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            limits: QueryLimits::default(),
        }
    }
}

impl Config {
    /// Read the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> ExplorerResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ExplorerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            rpc_url: get("SOLANA_RPC_URL").unwrap_or(defaults.rpc_url),
            helius_api_key: get("HELIUS_API_KEY"),
            redis_url: get("REDIS_URL"),
            database_url: get("DATABASE_URL"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            rpc_concurrency: number(&get, "RPC_CONCURRENCY", defaults.rpc_concurrency)?,
            rpc_max_retries: number(&get, "RPC_MAX_RETRIES", defaults.rpc_max_retries)?,
            rpc_timeout: Duration::from_secs(number(&get, "RPC_TIMEOUT_SECS", defaults.rpc_timeout.as_secs())?),
            request_timeout: Duration::from_secs(number(
                &get,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            limits: QueryLimits {
                history_max_count: number(&get, "HISTORY_MAX_COUNT", defaults.limits.history_max_count)?,
                max_window_days: number(&get, "MAX_WINDOW_DAYS", defaults.limits.max_window_days)?,
            },
        };

        if config.rpc_concurrency == 0 {
            return Err(ExplorerError::Configuration(
                "RPC_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        for (key, value) in [
            ("RPC_TIMEOUT_SECS", config.rpc_timeout),
            ("REQUEST_TIMEOUT_SECS", config.request_timeout),
        ] {
            if value.is_zero() {
                return Err(ExplorerError::Configuration(format!("{} must be at least 1", key)));
            }
        }

        Ok(config)
    }
}

fn number<T, G>(get: &G, key: &str, default: T) -> ExplorerResult<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ExplorerError::Configuration(format!("{} must be a number, got {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> ExplorerResult<Config> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.rpc_concurrency, 10);
        assert_eq!(config.limits.history_max_count, 1000);
        assert!(config.redis_url.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn overrides_and_blank_values() {
        let config = from_map(&[
            ("SOLANA_RPC_URL", "http://localhost:8899"),
            ("RPC_CONCURRENCY", "4"),
            ("MAX_WINDOW_DAYS", "90"),
            ("REDIS_URL", "   "),
        ])
        .unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.rpc_concurrency, 4);
        assert_eq!(config.limits.max_window_days, 90);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(matches!(
            from_map(&[("RPC_CONCURRENCY", "many")]),
            Err(ExplorerError::Configuration(_))
        ));
        assert!(matches!(
            from_map(&[("RPC_CONCURRENCY", "0")]),
            Err(ExplorerError::Configuration(_))
        ));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        for key in ["RPC_TIMEOUT_SECS", "REQUEST_TIMEOUT_SECS"] {
            match from_map(&[(key, "0")]) {
                Err(ExplorerError::Configuration(msg)) => assert!(msg.contains(key)),
                other => panic!("{} = 0 was accepted: {:?}", key, other.map(|c| c.request_timeout)),
            }
        }
        assert_eq!(
            from_map(&[("REQUEST_TIMEOUT_SECS", "5")]).unwrap().request_timeout,
            Duration::from_secs(5)
        );
    }
}
