pub mod client;
pub mod fetcher;
pub mod helius;
pub mod parser;

pub use client::{ChainRpc, MAX_SIGNATURES_PER_REQUEST, SolanaRpcClient};
pub use fetcher::TransactionHistoryFetcher;
pub use helius::HeliusClient;
