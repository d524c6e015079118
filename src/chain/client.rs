use crate::chain::parser;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::rpc_model::{
    AccountValue, BlockResult, KeyedTokenAccount, RpcEnvelope, SignatureInfo, TransactionResult,
    WithContext,
};
use crate::models::{AccountInfo, Address, BlockInfo, SignatureRecord, TOKEN_PROGRAM_ID, TokenAccount, Transaction};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use solana_client::rpc_request::RpcRequest;
use solana_transaction_status::{TransactionDetails, UiTransactionEncoding};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// `getSignaturesForAddress` refuses limits above this.
pub const MAX_SIGNATURES_PER_REQUEST: usize = 1000;

// Node error codes meaning "this slot/block has no data", not a transport failure.
const BLOCK_NOT_AVAILABLE: i64 = -32004;
const SLOT_SKIPPED: i64 = -32007;
const LONG_TERM_STORAGE_SLOT_SKIPPED: i64 = -32009;

/// Remote reads the aggregation engine consumes. `Ok(None)` means the chain
/// reported the entity absent.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_account(&self, address: &Address) -> ExplorerResult<Option<AccountInfo>>;

    async fn list_signatures(&self, address: &Address, limit: usize) -> ExplorerResult<Vec<SignatureRecord>>;

    async fn get_transaction(&self, signature: &str) -> ExplorerResult<Option<Transaction>>;

    async fn get_block(&self, slot: u64) -> ExplorerResult<Option<BlockInfo>>;

    async fn get_slot(&self) -> ExplorerResult<u64>;

    async fn get_block_height(&self) -> ExplorerResult<u64>;

    async fn get_token_accounts(&self, owner: &Address) -> ExplorerResult<Vec<TokenAccount>>;
}

/// JSON-RPC over HTTP against a Solana node.
pub struct SolanaRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    max_retries: u32,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: &str, timeout: Duration, max_retries: u32) -> ExplorerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            max_retries,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Send one request. Only HTTP 429 is retried, with a linear backoff.
    async fn call(&self, method: RpcRequest, params: Value) -> ExplorerResult<RpcEnvelope> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = method.build_request_json(id, params);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = self.http.post(&self.rpc_url).json(&request).send().await?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt > self.max_retries {
                    return Err(ExplorerError::ChainUnavailable(format!(
                        "{} rate limited after {} attempts",
                        method, attempt
                    )));
                }
                warn!("{} rate limited on attempt {}. Cooling down...", method, attempt);
                sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(ExplorerError::ChainUnavailable(format!(
                    "{} returned HTTP {}",
                    method,
                    response.status()
                )));
            }

            return Ok(response.json::<RpcEnvelope>().await?);
        }
    }

    /// `Ok(None)` when the node answered `null`.
    async fn call_for<T: DeserializeOwned>(&self, method: RpcRequest, params: Value) -> ExplorerResult<Option<T>> {
        let envelope = self.call(method, params).await?;
        decode(method, envelope)
    }

    async fn call_required<T: DeserializeOwned>(&self, method: RpcRequest, params: Value) -> ExplorerResult<T> {
        self.call_for(method, params)
            .await?
            .ok_or_else(|| ExplorerError::ChainUnavailable(format!("{} returned no result", method)))
    }
}

/// Unwrap a response envelope. A `null` or absent result is `Ok(None)`; node
/// errors and undecodable results are `ChainUnavailable`.
fn decode<T: DeserializeOwned>(method: RpcRequest, envelope: RpcEnvelope) -> ExplorerResult<Option<T>> {
    if let Some(error) = envelope.error {
        return Err(ExplorerError::ChainUnavailable(format!(
            "{} failed ({}): {}",
            method, error.code, error.message
        )));
    }

    match envelope.result {
        None | Some(Value::Null) => Ok(None),
        Some(result) => serde_json::from_value(result).map(Some).map_err(|e| {
            ExplorerError::ChainUnavailable(format!("{} returned an unexpected shape: {}", method, e))
        }),
    }
}

/// Like `decode`, but the node's "no block in this slot" codes are absence.
fn decode_block(slot: u64, envelope: RpcEnvelope) -> ExplorerResult<Option<BlockInfo>> {
    if let Some(error) = &envelope.error {
        if matches!(
            error.code,
            BLOCK_NOT_AVAILABLE | SLOT_SKIPPED | LONG_TERM_STORAGE_SLOT_SKIPPED
        ) {
            debug!("slot {} has no block: {}", slot, error.message);
            return Ok(None);
        }
    }

    let block: Option<BlockResult> = decode(RpcRequest::GetBlock, envelope)?;
    Ok(block.map(|block| parser::parse_block(slot, block)))
}

#[async_trait]
impl ChainRpc for SolanaRpcClient {
    async fn get_account(&self, address: &Address) -> ExplorerResult<Option<AccountInfo>> {
        let params = json!([address.as_str(), { "encoding": "base64", "commitment": "confirmed" }]);
        let response: WithContext<Option<AccountValue>> =
            self.call_required(RpcRequest::GetAccountInfo, params).await?;

        Ok(response.value.map(|value| parser::parse_account(address, value)))
    }

    async fn list_signatures(&self, address: &Address, limit: usize) -> ExplorerResult<Vec<SignatureRecord>> {
        let limit = limit.min(MAX_SIGNATURES_PER_REQUEST);
        let params = json!([address.as_str(), { "limit": limit, "commitment": "confirmed" }]);
        let infos: Vec<SignatureInfo> = self
            .call_for(RpcRequest::GetSignaturesForAddress, params)
            .await?
            .unwrap_or_default();

        debug!("{} signatures listed for {}", infos.len(), address);
        infos.into_iter().map(parser::parse_signature).collect()
    }

    async fn get_transaction(&self, signature: &str) -> ExplorerResult<Option<Transaction>> {
        let params = json!([
            signature,
            {
                "encoding": UiTransactionEncoding::Json,
                "commitment": "confirmed",
                "maxSupportedTransactionVersion": 0
            }
        ]);

        match self.call_for::<TransactionResult>(RpcRequest::GetTransaction, params).await? {
            Some(tx) => parser::parse_transaction(signature, tx).map(Some),
            None => Ok(None),
        }
    }

    async fn get_block(&self, slot: u64) -> ExplorerResult<Option<BlockInfo>> {
        let params = json!([
            slot,
            {
                "encoding": UiTransactionEncoding::Json,
                "transactionDetails": TransactionDetails::Signatures,
                "rewards": false,
                "commitment": "confirmed",
                "maxSupportedTransactionVersion": 0
            }
        ]);

        let envelope = self.call(RpcRequest::GetBlock, params).await?;
        decode_block(slot, envelope)
    }

    async fn get_slot(&self) -> ExplorerResult<u64> {
        self.call_required(RpcRequest::GetSlot, json!([{ "commitment": "confirmed" }]))
            .await
    }

    async fn get_block_height(&self) -> ExplorerResult<u64> {
        self.call_required(RpcRequest::GetBlockHeight, json!([{ "commitment": "confirmed" }]))
            .await
    }

    async fn get_token_accounts(&self, owner: &Address) -> ExplorerResult<Vec<TokenAccount>> {
        let params = json!([
            owner.as_str(),
            { "programId": TOKEN_PROGRAM_ID },
            { "encoding": "jsonParsed", "commitment": "confirmed" }
        ]);
        let response: WithContext<Vec<KeyedTokenAccount>> =
            self.call_required(RpcRequest::GetTokenAccountsByOwner, params).await?;

        response.value.into_iter().map(parser::parse_token_account).collect()
    }
}
