use super::chain_model::{AccountInfo, Address, BlockInfo, PurchaseEvent, TokenAccount, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ==========================================
// 1. CLASSIFIER OUTPUT
// ==========================================

/// What the intent classifier returns for a free-text question.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParsedQuery {
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: QueryEntities,
    pub confidence: Option<f64>,
    pub original_query: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryEntities {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub wallet_address: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub timeframe: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub token_address: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub limit: Option<String>,
}

/// Models answer with strings, numbers, nulls or "" for absent entities.
fn non_empty_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ==========================================
// 2. REPORTS
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionsReport {
    pub wallet_address: Address,
    pub timeframe_days: u32,
    pub interaction_count: usize,
    pub interactions: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasesReport {
    pub wallet_address: Address,
    pub timeframe_days: u32,
    pub purchase_count: usize,
    pub purchases: Vec<PurchaseEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub signature: String,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    pub slot: u64,
    #[serde(rename = "confirmationStatus")]
    pub confirmation_status: Option<String>,
    pub success: bool,
}

impl From<&Transaction> for TransactionSummary {
    fn from(tx: &Transaction) -> Self {
        Self {
            signature: tx.signature.clone(),
            block_time: tx.block_time,
            slot: tx.slot,
            confirmation_status: tx.confirmation_status.clone(),
            success: tx.is_success(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub wallet_address: Address,
    pub transaction_count: usize,
    pub transactions: Vec<TransactionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountReport {
    pub wallet_address: Address,
    pub account_info: AccountInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalancesReport {
    pub wallet_address: Address,
    pub token_count: usize,
    pub tokens: Vec<TokenAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocksReport {
    pub block_count: usize,
    pub blocks: Vec<BlockInfo>,
}

/// Result of dispatching one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Interactions(InteractionsReport),
    Purchases(PurchasesReport),
    History(HistoryReport),
    Account(AccountReport),
    TokenBalances(TokenBalancesReport),
    Blocks(BlocksReport),
}

/// Final answer to a natural-language question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub query: ParsedQuery,
    pub data: QueryOutcome,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope returned by every gateway operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cached<T> {
    pub data: T,
    pub cached: bool,
}
