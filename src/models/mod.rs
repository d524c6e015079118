pub mod chain_model;
pub mod query_model;
pub mod rpc_model;

pub use chain_model::*;
pub use query_model::*;
