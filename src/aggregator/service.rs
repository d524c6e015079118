use super::{interactions, purchases};
use crate::chain::{ChainRpc, TransactionHistoryFetcher};
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{AccountInfo, Address, BlockInfo, PurchaseEvent, TimeWindow, TokenAccount, Transaction};
use futures_util::{StreamExt, stream};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Most blocks a single recent-blocks read will walk back.
pub const MAX_RECENT_BLOCKS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Signatures pulled for aggregation and detection.
    pub history_max_count: usize,
    pub max_window_days: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            history_max_count: 1000,
            max_window_days: 365,
        }
    }
}

/// Entry point to the aggregation engine and the direct chain reads.
/// Holds no per-request state.
#[derive(Clone)]
pub struct ChainService {
    rpc: Arc<dyn ChainRpc>,
    fetcher: TransactionHistoryFetcher,
    limits: QueryLimits,
}

impl ChainService {
    pub fn new(rpc: Arc<dyn ChainRpc>, concurrency: usize, limits: QueryLimits) -> Self {
        let fetcher = TransactionHistoryFetcher::new(rpc.clone(), concurrency);
        Self { rpc, fetcher, limits }
    }

    pub async fn fetch_history(&self, address: &str, max_count: usize) -> ExplorerResult<Vec<Transaction>> {
        self.fetcher.fetch(address, max_count).await
    }

    pub async fn aggregate_interactions(&self, address: &str, window_days: u32) -> ExplorerResult<HashSet<Address>> {
        let subject = Address::parse(address)?;
        let window = self.window(window_days)?;

        let history = self.fetcher.fetch_for(&subject, self.limits.history_max_count).await?;
        let found = interactions::aggregate_interactions(&history, &subject, &window);

        info!(
            "{} interacted with {} addresses in {} days",
            subject,
            found.len(),
            window_days
        );
        Ok(found)
    }

    pub async fn detect_purchases(&self, address: &str, window_days: u32) -> ExplorerResult<Vec<PurchaseEvent>> {
        self.detect_purchases_with(address, window_days, None).await
    }

    /// `program_filter` defaults to the SPL token program.
    pub async fn detect_purchases_with(
        &self,
        address: &str,
        window_days: u32,
        program_filter: Option<&str>,
    ) -> ExplorerResult<Vec<PurchaseEvent>> {
        let subject = Address::parse(address)?;
        let window = self.window(window_days)?;
        let program = match program_filter {
            Some(raw) => Address::parse(raw)
                .map_err(|_| ExplorerError::UnsupportedFilter(format!("program filter {} is not an address", raw)))?,
            None => Address::token_program(),
        };

        let history = self.fetcher.fetch_for(&subject, self.limits.history_max_count).await?;
        let found = purchases::detect_purchases(&history, &subject, &window, &program);

        info!(
            "{} has {} {} instructions in {} days",
            subject,
            found.len(),
            program.short(),
            window_days
        );
        Ok(found)
    }

    pub async fn account_info(&self, address: &str) -> ExplorerResult<AccountInfo> {
        let address = Address::parse(address)?;
        self.rpc
            .get_account(&address)
            .await?
            .ok_or_else(|| ExplorerError::NotFound(format!("Account {}", address)))
    }

    pub async fn token_balances(&self, address: &str) -> ExplorerResult<Vec<TokenAccount>> {
        let address = Address::parse(address)?;
        self.rpc.get_token_accounts(&address).await
    }

    /// Newest first; skipped slots are left out.
    pub async fn recent_blocks(&self, limit: usize) -> ExplorerResult<Vec<BlockInfo>> {
        let limit = limit.min(MAX_RECENT_BLOCKS);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let tip = self.rpc.get_slot().await?;
        let slots = (0..limit as u64).map_while(|i| tip.checked_sub(i));

        let results: Vec<ExplorerResult<Option<BlockInfo>>> = stream::iter(slots)
            .map(|slot| self.rpc.get_block(slot))
            .buffered(self.fetcher.concurrency())
            .collect()
            .await;

        let mut blocks = Vec::with_capacity(results.len());
        for result in results {
            if let Some(block) = result? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// Current slot and block height.
    pub async fn chain_status(&self) -> ExplorerResult<(u64, u64)> {
        let slot = self.rpc.get_slot().await?;
        let height = self.rpc.get_block_height().await?;
        Ok((slot, height))
    }

    fn window(&self, window_days: u32) -> ExplorerResult<TimeWindow> {
        if window_days == 0 || window_days > self.limits.max_window_days {
            return Err(ExplorerError::UnsupportedFilter(format!(
                "window of {} days is outside 1..={}",
                window_days, self.limits.max_window_days
            )));
        }
        Ok(TimeWindow::last_days(window_days))
    }
}
