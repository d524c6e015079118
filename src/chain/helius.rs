use crate::error::{ExplorerError, ExplorerResult};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

const HELIUS_API_BASE: &str = "https://api.helius.xyz/v0/transactions";

/// Helius enhanced transaction lookups (human readable descriptions, token
/// transfers, event classification).
pub struct HeliusClient {
    http: reqwest::Client,
    api_key: String,
    max_retries: u32,
}

impl HeliusClient {
    pub fn new(api_key: String, timeout: Duration, max_retries: u32) -> ExplorerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            max_retries,
        })
    }

    fn endpoint(&self) -> ExplorerResult<Url> {
        Url::parse_with_params(HELIUS_API_BASE, &[("api-key", self.api_key.as_str())])
            .map_err(|e| ExplorerError::Configuration(format!("Helius URL: {}", e)))
    }

    /// `Ok(None)` when Helius has no record of the signature.
    pub async fn enhanced_transaction(&self, signature: &str) -> ExplorerResult<Option<Value>> {
        let url = self.endpoint()?;
        let body = json!({ "transactions": [signature] });
        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = self.http.post(url.clone()).json(&body).send().await?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt > self.max_retries {
                    return Err(ExplorerError::ChainUnavailable(format!(
                        "Helius rate limited {} times",
                        attempt
                    )));
                }
                warn!("Helius rate limited on attempt {}. Cooling down...", attempt);
                sleep(Duration::from_secs(u64::from(attempt) * 2)).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(ExplorerError::ChainUnavailable(format!(
                    "Helius returned HTTP {}",
                    response.status()
                )));
            }

            let mut items: Vec<Value> = response.json().await?;
            info!("Helius returned {} enhanced records for {}", items.len(), signature);

            return Ok(if items.is_empty() {
                None
            } else {
                Some(items.swap_remove(0))
            });
        }
    }
}
