use super::{IntentClassifier, TextSummarizer};
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::ParsedQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CLASSIFIER_PROMPT: &str = r#"You are an expert at parsing natural language queries about Solana blockchain data.
Extract the intent and entities from user queries and return a structured JSON response.

Available intents:
- get_wallet_interactions: Find addresses that interacted with a specific wallet
- get_token_purchases: Get tokens purchased by a wallet
- get_transaction_history: Get transaction history for a wallet
- get_account_info: Get basic account information
- get_token_balances: Get token balances for a wallet
- get_recent_blocks: Get recent blockchain blocks

Entities to extract:
- wallet_address: Solana wallet addresses (base58 format)
- timeframe: Time periods (days, weeks, months)
- token_address: Specific token mint addresses
- limit: Number of results to return

Example queries:
"search the addresses that interacted with 9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM in the past week"
"give me a list of tokens this wallet purchased in the past 40 days"
"show me the transaction history for this address"
"what tokens does this wallet hold?"

Return JSON in this format:
{
  "intent": "intent_name",
  "entities": {
    "wallet_address": "address_if_found",
    "timeframe": "timeframe_if_specified",
    "token_address": "token_address_if_specified",
    "limit": "limit_if_specified"
  },
  "confidence": 0.95,
  "original_query": "original user query"
}"#;

const SUMMARIZER_PROMPT: &str = "You are a helpful assistant that explains Solana blockchain data in a clear, \
user-friendly way. Convert the raw blockchain data into a natural language response that answers \
the user's question.

Be concise but informative. Include relevant details like:
- Transaction counts
- Time ranges
- Token amounts (with proper formatting)
- Addresses (truncated for readability)
- Key insights or patterns

Format addresses as: first 4 chars...last 4 chars (e.g., 9WzD...AWWM)
Format large numbers with commas
Be conversational but professional";

// ============================================================================
// WIRE TYPES (Chat Completions API)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> ExplorerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        temperature: f32,
        max_tokens: u32,
        json_mode: bool,
    ) -> ExplorerResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
            response_format: json_mode.then_some(ResponseFormat { type_: "json_object" }),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExplorerError::LanguageModel(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExplorerError::LanguageModel(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExplorerError::LanguageModel(format!("unreadable completion: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExplorerError::LanguageModel("completion had no content".to_string()))
    }
}

#[async_trait]
impl IntentClassifier for OpenAiClient {
    async fn classify(&self, query: &str) -> ExplorerResult<ParsedQuery> {
        let content = self
            .complete(CLASSIFIER_PROMPT, query.to_string(), 0.1, 500, true)
            .await?;
        debug!("Classifier answered: {}", content);

        parse_classifier_output(&content)
    }
}

#[async_trait]
impl TextSummarizer for OpenAiClient {
    async fn summarize(&self, query: &str, intent: &str, data: &serde_json::Value) -> ExplorerResult<String> {
        let pretty = serde_json::to_string_pretty(data)
            .map_err(|e| ExplorerError::LanguageModel(e.to_string()))?;
        let prompt = format!(
            "User query: \"{}\"\n\nIntent: {}\n\nData: {}\n\nGenerate a helpful response:",
            query, intent, pretty
        );

        self.complete(SUMMARIZER_PROMPT, prompt, 0.3, 800, false).await
    }
}

/// Models sometimes wrap JSON in a fenced block.
fn parse_classifier_output(content: &str) -> ExplorerResult<ParsedQuery> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim())
        .map_err(|e| ExplorerError::LanguageModel(format!("Failed to parse query: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_output_tolerates_fences() {
        let raw = "```json\n{\"intent\":\"get_recent_blocks\",\"entities\":{\"limit\":\"5\"}}\n```";
        let parsed = parse_classifier_output(raw).unwrap();
        assert_eq!(parsed.intent.as_deref(), Some("get_recent_blocks"));
        assert_eq!(parsed.entities.limit.as_deref(), Some("5"));
    }

    #[test]
    fn classifier_garbage_is_an_error() {
        assert!(matches!(
            parse_classifier_output("I think you want blocks"),
            Err(ExplorerError::LanguageModel(_))
        ));
    }

    #[test]
    fn json_mode_only_when_asked() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: vec![],
            temperature: 0.3,
            max_tokens: 800,
            response_format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["model"], "gpt-4");
    }
}
