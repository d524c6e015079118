use crate::chain::client::{ChainRpc, MAX_SIGNATURES_PER_REQUEST};
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{Address, SignatureRecord, Transaction};
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves an address's signature list into full transactions.
///
/// Resolutions run concurrently, at most `concurrency` at a time, and come
/// back in signature order. A signature that cannot be resolved is dropped
/// from the result. The fetch fails when the listing call fails, or when
/// every listed signature errored.
#[derive(Clone)]
pub struct TransactionHistoryFetcher {
    rpc: Arc<dyn ChainRpc>,
    concurrency: usize,
}

impl TransactionHistoryFetcher {
    pub fn new(rpc: Arc<dyn ChainRpc>, concurrency: usize) -> Self {
        Self {
            rpc,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn fetch(&self, address: &str, max_count: usize) -> ExplorerResult<Vec<Transaction>> {
        let address = Address::parse(address)?;
        self.fetch_for(&address, max_count).await
    }

    pub async fn fetch_for(&self, address: &Address, max_count: usize) -> ExplorerResult<Vec<Transaction>> {
        let limit = max_count.min(MAX_SIGNATURES_PER_REQUEST);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let records = self.rpc.list_signatures(address, limit).await?;
        let requested = records.len();

        // `buffered` keeps input order regardless of completion order.
        let outcomes: Vec<Resolution> = stream::iter(records)
            .map(|record| self.resolve(record))
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| matches!(o, Resolution::Failed)).count();
        if requested > 0 && failed == requested {
            return Err(ExplorerError::ChainUnavailable(format!(
                "all {} transaction lookups for {} failed",
                failed, address
            )));
        }

        let transactions: Vec<Transaction> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Resolution::Resolved(tx) => Some(tx),
                Resolution::Missing | Resolution::Failed => None,
            })
            .collect();

        info!(
            "Resolved {}/{} transactions for {} ({} failed)",
            transactions.len(),
            requested,
            address,
            failed
        );

        Ok(transactions)
    }

    async fn resolve(&self, record: SignatureRecord) -> Resolution {
        match self.rpc.get_transaction(&record.signature).await {
            Ok(Some(tx)) => Resolution::Resolved(merge(record, tx)),
            Ok(None) => {
                debug!("Transaction {} not found, skipping", record.signature);
                Resolution::Missing
            }
            Err(e) => {
                debug!("Failed to resolve {}: {}", record.signature, e);
                Resolution::Failed
            }
        }
    }
}

enum Resolution {
    Resolved(Transaction),
    Missing,
    Failed,
}

/// The listing's block time and status win; the node fills in what the
/// listing left out.
fn merge(record: SignatureRecord, mut tx: Transaction) -> Transaction {
    tx.signature = record.signature;
    tx.slot = record.slot;
    tx.block_time = record.block_time.or(tx.block_time);
    tx.confirmation_status = record.confirmation_status;
    if tx.err.is_none() {
        tx.err = record.err;
    }
    tx
}
