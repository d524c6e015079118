pub mod aggregator;
pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod nlp;
pub mod redis;
pub mod router;

pub use error::{ExplorerError, ExplorerResult};
pub use gateway::Explorer;
