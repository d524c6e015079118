//! Maps a classified question onto one chain operation.

use crate::aggregator::ChainService;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{
    AccountReport, Address, BlocksReport, HistoryReport, InteractionsReport, ParsedQuery, PurchasesReport,
    QueryEntities, QueryOutcome, TokenBalancesReport, TransactionSummary,
};
use crate::nlp::parse_timeframe;
use tracing::info;

pub const DEFAULT_INTERACTION_DAYS: u32 = 7;
pub const DEFAULT_PURCHASE_DAYS: u32 = 40;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_BLOCK_LIMIT: usize = 10;

/// Lists in natural-language answers are cut to this many entries.
pub const QUERY_LIST_LIMIT: usize = 50;

/// Every question the gateway can answer, with the entities it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    WalletInteractions {
        address: Address,
        window_days: u32,
    },
    TokenPurchases {
        address: Address,
        window_days: u32,
        program_filter: Option<Address>,
    },
    TransactionHistory {
        address: Address,
        limit: usize,
    },
    AccountInfo {
        address: Address,
    },
    TokenBalances {
        address: Address,
    },
    RecentBlocks {
        limit: usize,
    },
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::WalletInteractions { .. } => "get_wallet_interactions",
            Intent::TokenPurchases { .. } => "get_token_purchases",
            Intent::TransactionHistory { .. } => "get_transaction_history",
            Intent::AccountInfo { .. } => "get_account_info",
            Intent::TokenBalances { .. } => "get_token_balances",
            Intent::RecentBlocks { .. } => "get_recent_blocks",
        }
    }

    /// Validate classifier output and fill in defaults.
    pub fn from_parsed(parsed: &ParsedQuery) -> ExplorerResult<Self> {
        let label = parsed.intent.as_deref().ok_or(ExplorerError::UnrecognizedQuery)?;
        let entities = &parsed.entities;

        let intent = match label {
            "get_wallet_interactions" => Intent::WalletInteractions {
                address: wallet(entities, "get_wallet_interactions")?,
                window_days: days(entities, DEFAULT_INTERACTION_DAYS),
            },
            "get_token_purchases" => Intent::TokenPurchases {
                address: wallet(entities, "get_token_purchases")?,
                window_days: days(entities, DEFAULT_PURCHASE_DAYS),
                program_filter: entities
                    .token_address
                    .as_deref()
                    .map(|raw| {
                        Address::parse(raw).map_err(|_| {
                            ExplorerError::UnsupportedFilter(format!("token address {} is not an address", raw))
                        })
                    })
                    .transpose()?,
            },
            "get_transaction_history" => Intent::TransactionHistory {
                address: wallet(entities, "get_transaction_history")?,
                limit: limit(entities, DEFAULT_HISTORY_LIMIT)?,
            },
            "get_account_info" => Intent::AccountInfo {
                address: wallet(entities, "get_account_info")?,
            },
            "get_token_balances" => Intent::TokenBalances {
                address: wallet(entities, "get_token_balances")?,
            },
            "get_recent_blocks" => Intent::RecentBlocks {
                limit: limit(entities, DEFAULT_BLOCK_LIMIT)?,
            },
            other => return Err(ExplorerError::UnsupportedIntent(other.to_string())),
        };

        Ok(intent)
    }
}

fn wallet(entities: &QueryEntities, intent: &'static str) -> ExplorerResult<Address> {
    let raw = entities
        .wallet_address
        .as_deref()
        .ok_or(ExplorerError::MissingEntity {
            intent,
            entity: "wallet_address",
        })?;
    Address::parse(raw)
}

fn days(entities: &QueryEntities, default: u32) -> u32 {
    entities.timeframe.as_deref().map(parse_timeframe).unwrap_or(default)
}

fn limit(entities: &QueryEntities, default: usize) -> ExplorerResult<usize> {
    match entities.limit.as_deref() {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ExplorerError::UnsupportedFilter(format!("limit {} is not a number", raw))),
    }
}

/// Runs intents against the chain service and shapes the reports.
#[derive(Clone)]
pub struct QueryRouter {
    service: ChainService,
    list_limit: usize,
}

impl QueryRouter {
    pub fn new(service: ChainService) -> Self {
        Self::with_list_limit(service, QUERY_LIST_LIMIT)
    }

    pub fn with_list_limit(service: ChainService, list_limit: usize) -> Self {
        Self { service, list_limit }
    }

    pub async fn execute(&self, intent: &Intent) -> ExplorerResult<QueryOutcome> {
        info!("Executing {}", intent.label());

        let outcome = match intent {
            Intent::WalletInteractions { address, window_days } => {
                let found = self
                    .service
                    .aggregate_interactions(address.as_str(), *window_days)
                    .await?;
                QueryOutcome::Interactions(self.interactions_report(address, *window_days, found))
            }
            Intent::TokenPurchases {
                address,
                window_days,
                program_filter,
            } => {
                let purchases = self
                    .service
                    .detect_purchases_with(
                        address.as_str(),
                        *window_days,
                        program_filter.as_ref().map(Address::as_str),
                    )
                    .await?;
                QueryOutcome::Purchases(PurchasesReport {
                    wallet_address: address.clone(),
                    timeframe_days: *window_days,
                    purchase_count: purchases.len(),
                    purchases: purchases.into_iter().take(self.list_limit).collect(),
                })
            }
            Intent::TransactionHistory { address, limit } => {
                let history = self.service.fetch_history(address.as_str(), *limit).await?;
                QueryOutcome::History(HistoryReport {
                    wallet_address: address.clone(),
                    transaction_count: history.len(),
                    transactions: history.iter().map(TransactionSummary::from).collect(),
                })
            }
            Intent::AccountInfo { address } => {
                let account_info = self.service.account_info(address.as_str()).await?;
                QueryOutcome::Account(AccountReport {
                    wallet_address: address.clone(),
                    account_info,
                })
            }
            Intent::TokenBalances { address } => {
                let tokens = self.service.token_balances(address.as_str()).await?;
                QueryOutcome::TokenBalances(TokenBalancesReport {
                    wallet_address: address.clone(),
                    token_count: tokens.len(),
                    tokens,
                })
            }
            Intent::RecentBlocks { limit } => {
                let blocks = self.service.recent_blocks(*limit).await?;
                QueryOutcome::Blocks(BlocksReport {
                    block_count: blocks.len(),
                    blocks,
                })
            }
        };

        Ok(outcome)
    }

    /// Sorted so repeated calls render identically.
    fn interactions_report(
        &self,
        address: &Address,
        window_days: u32,
        found: std::collections::HashSet<Address>,
    ) -> InteractionsReport {
        let mut interactions: Vec<Address> = found.into_iter().collect();
        interactions.sort();
        let interaction_count = interactions.len();
        interactions.truncate(self.list_limit);

        InteractionsReport {
            wallet_address: address.clone(),
            timeframe_days: window_days,
            interaction_count,
            interactions,
        }
    }
}
