pub mod interactions;
pub mod purchases;
pub mod service;

pub use interactions::aggregate_interactions;
pub use purchases::detect_purchases;
pub use service::{ChainService, MAX_RECENT_BLOCKS, QueryLimits};
