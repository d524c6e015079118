//! Hosted language model capabilities: turning a question into an intent
//! and turning a result back into prose.

pub mod openai;
pub mod timeframe;

use crate::error::ExplorerResult;
use crate::models::ParsedQuery;
use async_trait::async_trait;

pub use openai::OpenAiClient;
pub use timeframe::{DEFAULT_TIMEFRAME_DAYS, parse_timeframe};

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> ExplorerResult<ParsedQuery>;
}

#[async_trait]
pub trait TextSummarizer: Send + Sync {
    async fn summarize(&self, query: &str, intent: &str, data: &serde_json::Value) -> ExplorerResult<String>;
}

/// Answer used when the summarizer is unavailable.
pub fn fallback_response(data: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!("Here's the data for your query: {}", pretty)
}
