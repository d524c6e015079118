#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use explorer::error::{ExplorerError, ExplorerResult};
use explorer::models::{AccountInfo, Address, BlockInfo, Instruction, SignatureRecord, TokenAccount, Transaction};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const SYSTEM: &str = "11111111111111111111111111111111";
pub const TOKEN: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const CLOCK: &str = "SysvarC1ock11111111111111111111111111111111";
pub const RENT: &str = "SysvarRent111111111111111111111111111111111";
pub const ATA: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

pub fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

pub fn days_ago(days: i64) -> Option<i64> {
    Some(Utc::now().timestamp() - days * 86_400)
}

pub fn ix(program: &str, accounts: &[&str]) -> Instruction {
    Instruction {
        program_id: addr(program),
        accounts: accounts.iter().map(|a| addr(a)).collect(),
        data: vec![3],
    }
}

pub fn tx(signature: &str, block_time: Option<i64>, keys: &[&str], instructions: Vec<Instruction>) -> Transaction {
    Transaction {
        signature: signature.to_string(),
        slot: 0,
        block_time,
        confirmation_status: None,
        err: None,
        account_keys: keys.iter().map(|k| addr(k)).collect(),
        instructions,
    }
}

/// In-memory chain. History is listed in the order given; signatures in
/// `unresolvable` come back as "not found"; with `resolve_fails` every
/// lookup errors. `resolve_delay` holds each lookup open on tokio's clock.
#[derive(Default)]
pub struct FakeChain {
    pub history: Vec<Transaction>,
    pub unresolvable: Vec<String>,
    pub accounts: HashMap<String, AccountInfo>,
    pub blocks: HashMap<u64, BlockInfo>,
    pub tip: u64,
    pub tokens: Vec<TokenAccount>,
    pub list_fails: bool,
    pub resolve_fails: bool,
    pub resolve_delay: Option<Duration>,
    pub list_calls: AtomicUsize,
    pub resolved: Mutex<Vec<String>>,
}

impl FakeChain {
    pub fn with_history(history: Vec<Transaction>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.lock().unwrap().len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl explorer::chain::ChainRpc for FakeChain {
    async fn get_account(&self, address: &Address) -> ExplorerResult<Option<AccountInfo>> {
        Ok(self.accounts.get(address.as_str()).cloned())
    }

    async fn list_signatures(&self, _address: &Address, limit: usize) -> ExplorerResult<Vec<SignatureRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_fails {
            return Err(ExplorerError::ChainUnavailable("503 from upstream".into()));
        }
        self.history
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, t)| {
                SignatureRecord::new(t.signature.clone(), 10_000 - i as u64).map(|r| r.with_block_time(t.block_time))
            })
            .collect()
    }

    async fn get_transaction(&self, signature: &str) -> ExplorerResult<Option<Transaction>> {
        self.resolved.lock().unwrap().push(signature.to_string());
        if let Some(delay) = self.resolve_delay {
            tokio::time::sleep(delay).await;
        }
        if self.resolve_fails {
            return Err(ExplorerError::ChainUnavailable("HTTP 503".into()));
        }
        if self.unresolvable.iter().any(|s| s == signature) {
            return Ok(None);
        }
        Ok(self.history.iter().find(|t| t.signature == signature).cloned())
    }

    async fn get_block(&self, slot: u64) -> ExplorerResult<Option<BlockInfo>> {
        Ok(self.blocks.get(&slot).cloned())
    }

    async fn get_slot(&self) -> ExplorerResult<u64> {
        Ok(self.tip)
    }

    async fn get_block_height(&self) -> ExplorerResult<u64> {
        Ok(self.tip.saturating_sub(20))
    }

    async fn get_token_accounts(&self, _owner: &Address) -> ExplorerResult<Vec<TokenAccount>> {
        Ok(self.tokens.clone())
    }
}
