//! Cache-aside facade over the chain service and the natural-language pipeline.

use crate::aggregator::ChainService;
use crate::chain::{HeliusClient, SolanaRpcClient};
use crate::config::Config;
use crate::db;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{
    AccountInfo, Address, BlockInfo, Cached, InteractionsReport, PurchasesReport, QueryAnswer, QueryOutcome,
    TokenAccount, Transaction,
};
use crate::nlp::{self, IntentClassifier, OpenAiClient, TextSummarizer};
use crate::redis::RedisClient;
use crate::router::{Intent, QUERY_LIST_LIMIT, QueryRouter};
use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lists in structured reports are cut to this many entries.
pub const STRUCTURED_LIST_LIMIT: usize = 100;

pub mod ttl {
    pub const ACCOUNT: u64 = 300;
    pub const TRANSACTIONS: u64 = 120;
    pub const TOKENS: u64 = 300;
    pub const BLOCKS: u64 = 30;
    pub const INTERACTIONS: u64 = 600;
    pub const PURCHASES: u64 = 600;
    pub const QUERY: u64 = 300;
}

pub struct Explorer {
    service: ChainService,
    query_router: QueryRouter,
    cache: Option<RedisClient>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    summarizer: Option<Arc<dyn TextSummarizer>>,
    helius: Option<HeliusClient>,
    database: Option<PgPool>,
    request_timeout: Duration,
    started_at: Instant,
}

impl Explorer {
    pub fn new(service: ChainService) -> Self {
        Self {
            query_router: QueryRouter::with_list_limit(service.clone(), QUERY_LIST_LIMIT),
            service,
            cache: None,
            classifier: None,
            summarizer: None,
            helius: None,
            database: None,
            request_timeout: Duration::from_secs(120),
            started_at: Instant::now(),
        }
    }

    pub fn with_cache(mut self, cache: RedisClient) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_language_model(
        mut self,
        classifier: Arc<dyn IntentClassifier>,
        summarizer: Arc<dyn TextSummarizer>,
    ) -> Self {
        self.classifier = Some(classifier);
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_helius(mut self, helius: HeliusClient) -> Self {
        self.helius = Some(helius);
        self
    }

    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Wire every collaborator the configuration enables. Redis being
    /// unreachable is not fatal; the explorer then runs uncached.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let rpc = SolanaRpcClient::new(&config.rpc_url, config.rpc_timeout, config.rpc_max_retries)?;
        info!("Using Solana RPC at {}", rpc.rpc_url());

        let service = ChainService::new(Arc::new(rpc), config.rpc_concurrency, config.limits);
        let mut explorer = Self::new(service).with_request_timeout(config.request_timeout);

        if let Some(url) = &config.redis_url {
            match RedisClient::new(url).await {
                Ok(cache) => explorer = explorer.with_cache(cache),
                Err(e) => warn!("⚠️ Redis unavailable, running without cache: {:#}", e),
            }
        }

        if let Some(url) = &config.database_url {
            explorer = explorer.with_database(db::get_db_pool(url)?);
        }

        if let Some(key) = &config.openai_api_key {
            let client = Arc::new(
                OpenAiClient::new(
                    key.clone(),
                    config.openai_model.clone(),
                    config.openai_base_url.clone(),
                    config.rpc_timeout,
                )
                .context("Failed to build OpenAI client")?,
            );
            explorer = explorer.with_language_model(client.clone(), client);
        }

        if let Some(key) = &config.helius_api_key {
            explorer = explorer.with_helius(HeliusClient::new(key.clone(), config.rpc_timeout, config.rpc_max_retries)?);
        }

        Ok(explorer)
    }

    // ==========================================
    // STRUCTURED LOOKUPS
    // ==========================================

    pub async fn account(&self, address: &str) -> ExplorerResult<Cached<AccountInfo>> {
        let address = Address::parse(address)?;
        self.cached(format!("account:{}", address), ttl::ACCOUNT, || {
            self.service.account_info(address.as_str())
        })
        .await
    }

    pub async fn transactions(&self, address: &str, limit: usize) -> ExplorerResult<Cached<Vec<Transaction>>> {
        let address = Address::parse(address)?;
        self.cached(format!("transactions:{}:{}", address, limit), ttl::TRANSACTIONS, || {
            self.service.fetch_history(address.as_str(), limit)
        })
        .await
    }

    pub async fn tokens(&self, address: &str) -> ExplorerResult<Cached<Vec<TokenAccount>>> {
        let address = Address::parse(address)?;
        self.cached(format!("tokens:{}", address), ttl::TOKENS, || {
            self.service.token_balances(address.as_str())
        })
        .await
    }

    pub async fn blocks(&self, limit: usize) -> ExplorerResult<Cached<Vec<BlockInfo>>> {
        self.cached(format!("blocks:{}", limit), ttl::BLOCKS, || self.service.recent_blocks(limit))
            .await
    }

    pub async fn interactions(&self, address: &str, days: u32) -> ExplorerResult<Cached<InteractionsReport>> {
        let address = Address::parse(address)?;
        let router = QueryRouter::with_list_limit(self.service.clone(), STRUCTURED_LIST_LIMIT);
        let intent = Intent::WalletInteractions {
            address: address.clone(),
            window_days: days,
        };

        self.cached(format!("interactions:{}:{}", address, days), ttl::INTERACTIONS, || async {
            match router.execute(&intent).await? {
                QueryOutcome::Interactions(report) => Ok(report),
                other => Err(unexpected(&intent, &other)),
            }
        })
        .await
    }

    pub async fn purchases(&self, address: &str, days: u32) -> ExplorerResult<Cached<PurchasesReport>> {
        let address = Address::parse(address)?;
        let router = QueryRouter::with_list_limit(self.service.clone(), STRUCTURED_LIST_LIMIT);
        let intent = Intent::TokenPurchases {
            address: address.clone(),
            window_days: days,
            program_filter: None,
        };

        self.cached(format!("purchases:{}:{}", address, days), ttl::PURCHASES, || async {
            match router.execute(&intent).await? {
                QueryOutcome::Purchases(report) => Ok(report),
                other => Err(unexpected(&intent, &other)),
            }
        })
        .await
    }

    pub async fn enhanced_transaction(&self, signature: &str) -> ExplorerResult<Value> {
        let helius = self
            .helius
            .as_ref()
            .ok_or_else(|| ExplorerError::Configuration("Helius API key not configured".to_string()))?;

        self.deadline(helius.enhanced_transaction(signature))
            .await?
            .ok_or_else(|| ExplorerError::NotFound(format!("Transaction {}", signature)))
    }

    // ==========================================
    // NATURAL LANGUAGE
    // ==========================================

    pub async fn query(&self, text: &str) -> ExplorerResult<Cached<QueryAnswer>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExplorerError::EmptyQuery);
        }

        let key = format!("query:{}", STANDARD.encode(text));
        self.cached(key, ttl::QUERY, || self.answer(text)).await
    }

    async fn answer(&self, text: &str) -> ExplorerResult<QueryAnswer> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or_else(|| ExplorerError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let parsed = classifier.classify(text).await?;
        let intent = Intent::from_parsed(&parsed)?;
        let data = self.query_router.execute(&intent).await?;

        let json = serde_json::to_value(&data).unwrap_or(Value::Null);
        let response = match &self.summarizer {
            Some(summarizer) => match summarizer.summarize(text, intent.label(), &json).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Error generating response: {}", e);
                    nlp::fallback_response(&json)
                }
            },
            None => nlp::fallback_response(&json),
        };

        Ok(QueryAnswer {
            query: parsed,
            data,
            response,
            timestamp: Utc::now(),
        })
    }

    // ==========================================
    // HEALTH
    // ==========================================

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            message: "Solana explorer is running",
            timestamp: Utc::now(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }

    pub async fn health_detailed(&self) -> DetailedHealth {
        let database = match &self.database {
            None => ServiceHealth::not_configured(),
            Some(pool) => match db::database_version(pool).await {
                Ok(version) => ServiceHealth::connected(json!({ "version": version })),
                Err(e) => ServiceHealth::disconnected(format!("{:#}", e)),
            },
        };

        let redis = match self.cache.clone() {
            None => ServiceHealth::not_configured(),
            Some(mut cache) => match cache.server_info().await {
                Ok(info) => ServiceHealth::connected(json!({
                    "info": info
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect::<serde_json::Map<String, Value>>()
                })),
                Err(e) => ServiceHealth::disconnected(format!("{:#}", e)),
            },
        };

        let solana = match self.service.chain_status().await {
            Ok((slot, height)) => ServiceHealth::connected(json!({
                "currentSlot": slot,
                "blockHeight": height
            })),
            Err(e) => ServiceHealth::disconnected(e.to_string()),
        };

        DetailedHealth {
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: self.started_at.elapsed().as_secs(),
            services: Services {
                database,
                redis,
                solana,
            },
        }
    }

    // ==========================================
    // PLUMBING
    // ==========================================

    async fn cached<T, F, Fut>(&self, key: String, ttl_secs: u64, load: F) -> ExplorerResult<Cached<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ExplorerResult<T>>,
    {
        if let Some(mut cache) = self.cache.clone() {
            match cache.get::<T>(&key).await {
                Ok(Some(data)) => {
                    debug!("Cache hit for {}", key);
                    return Ok(Cached { data, cached: true });
                }
                Ok(None) => {}
                Err(e) => warn!("Cache read failed for {}: {:#}", key, e),
            }
        }

        let data = self.deadline(load()).await?;

        if let Some(mut cache) = self.cache.clone() {
            if let Err(e) = cache.set(&key, &data, Some(ttl_secs)).await {
                warn!("Cache write failed for {}: {:#}", key, e);
            }
        }

        Ok(Cached { data, cached: false })
    }

    /// Dropping the inner future on expiry abandons any in-flight RPC calls.
    async fn deadline<T, Fut>(&self, fut: Fut) -> ExplorerResult<T>
    where
        Fut: Future<Output = ExplorerResult<T>>,
    {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| ExplorerError::Timeout(self.request_timeout))?
    }
}

fn unexpected(intent: &Intent, outcome: &QueryOutcome) -> ExplorerError {
    ExplorerError::UnsupportedIntent(format!("{} produced {:?}", intent.label(), outcome))
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct DetailedHealth {
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub services: Services,
}

#[derive(Debug, Serialize)]
pub struct Services {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
    pub solana: ServiceHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    fn connected(details: Value) -> Self {
        Self {
            status: "connected",
            details: Some(details),
            error: None,
        }
    }

    fn disconnected(error: String) -> Self {
        Self {
            status: "disconnected",
            details: None,
            error: Some(error),
        }
    }

    fn not_configured() -> Self {
        Self {
            status: "not_configured",
            details: None,
            error: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}
