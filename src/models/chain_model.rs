use crate::error::{ExplorerError, ExplorerResult};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

// ==========================================
// 1. ADDRESS
// ==========================================

/// Base58 encoded public key. Compared and hashed by its textual value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> ExplorerResult<Self> {
        let trimmed = raw.trim();
        Pubkey::from_str(trimmed)
            .map_err(|_| ExplorerError::InvalidAddress(raw.to_string()))?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `9WzD...AWWM` style rendering for human readable output.
    pub fn short(&self) -> String {
        if self.0.len() <= 8 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..4], &self.0[self.0.len() - 4..])
    }

    pub fn token_program() -> Self {
        Self(TOKEN_PROGRAM_ID.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ExplorerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl PartialEq<str> for Address {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

// ==========================================
// 2. SIGNATURES & TRANSACTIONS
// ==========================================

/// One entry of `getSignaturesForAddress`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub confirmation_status: Option<String>,
    pub err: Option<serde_json::Value>,
}

impl SignatureRecord {
    pub fn new(signature: impl Into<String>, slot: u64) -> ExplorerResult<Self> {
        let signature = signature.into();
        if signature.trim().is_empty() {
            return Err(ExplorerError::ChainUnavailable(
                "chain returned an empty signature".to_string(),
            ));
        }
        Ok(Self {
            signature,
            slot,
            block_time: None,
            confirmation_status: None,
            err: None,
        })
    }

    pub fn with_block_time(mut self, block_time: Option<i64>) -> Self {
        self.block_time = block_time;
        self
    }
}

/// A single directive inside a transaction with its indices already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<Address>,
    #[serde(with = "base58_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub confirmation_status: Option<String>,
    pub err: Option<serde_json::Value>,
    pub account_keys: Vec<Address>,
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    pub fn is_success(&self) -> bool {
        self.err.as_ref().is_none_or(|e| e.is_null())
    }
}

/// Token program instruction observed inside a wallet's history.
///
/// Matching is by program identity only: sends, receives, approvals and swaps
/// routed through the token program are all reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEvent {
    pub signature: String,
    pub block_time: i64,
    pub instruction: Instruction,
}

// ==========================================
// 3. TIME WINDOW
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    days: u32,
    cutoff: i64,
}

impl TimeWindow {
    pub fn last_days(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        let cutoff = now - Duration::days(i64::from(days));
        Self {
            days,
            cutoff: cutoff.timestamp(),
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn cutoff(&self) -> i64 {
        self.cutoff
    }

    /// Unknown block times are never inside a window.
    pub fn contains(&self, block_time: Option<i64>) -> bool {
        block_time.is_some_and(|t| t >= self.cutoff)
    }
}

// ==========================================
// 4. DIRECT READS
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: Address,
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
    pub data_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub transaction_count: usize,
    pub parent_slot: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccount {
    pub address: String,
    pub mint: String,
    pub owner: String,
    pub amount: Decimal,
    pub decimals: u8,
}

mod base58_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bs58::encode(bytes).into_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        bs58::decode(raw).into_vec().map_err(serde::de::Error::custom)
    }
}
