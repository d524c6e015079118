use serde::{Deserialize, Serialize};

/// JSON-RPC response wrapper. `result` is kept raw so "null" can be told apart
/// from a decoding failure.
#[derive(Debug, Deserialize)]
pub struct RpcEnvelope {
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Wraps results that carry a `context` slot (getAccountInfo, getTokenAccountsByOwner).
#[derive(Debug, Deserialize)]
pub struct WithContext<T> {
    pub value: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    pub err: Option<serde_json::Value>,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    #[serde(rename = "confirmationStatus")]
    pub confirmation_status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionResult {
    pub slot: u64,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    pub transaction: TransactionData,
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionData {
    pub signatures: Vec<String>,
    pub message: TransactionMessage,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionMessage {
    #[serde(rename = "accountKeys")]
    pub account_keys: Vec<String>,
    pub instructions: Vec<CompiledInstruction>,
}

/// Instruction in `json` encoding: program and accounts are indices into the
/// message's combined key list, data is base58.
#[derive(Debug, Deserialize, Serialize)]
pub struct CompiledInstruction {
    #[serde(rename = "programIdIndex")]
    pub program_id_index: usize,
    #[serde(default)]
    pub accounts: Vec<usize>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionMeta {
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(rename = "loadedAddresses")]
    pub loaded_addresses: Option<LoadedAddresses>,
}

/// Keys pulled in through address lookup tables (v0 transactions).
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccountValue {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    #[serde(rename = "rentEpoch")]
    pub rent_epoch: u64,
    /// `[payload, encoding]`
    pub data: (String, String),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BlockResult {
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    #[serde(rename = "parentSlot")]
    pub parent_slot: u64,
    #[serde(default)]
    pub signatures: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct KeyedTokenAccount {
    pub pubkey: String,
    pub account: ParsedTokenAccount,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ParsedTokenAccount {
    pub data: ParsedTokenData,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ParsedTokenData {
    pub parsed: ParsedTokenPayload,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ParsedTokenPayload {
    pub info: TokenAccountInfo,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TokenAccountInfo {
    pub mint: String,
    pub owner: String,
    #[serde(rename = "tokenAmount")]
    pub token_amount: UiTokenAmount,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    #[serde(rename = "uiAmount")]
    pub ui_amount: Option<f64>,
    #[serde(rename = "uiAmountString")]
    pub ui_amount_string: String,
}
