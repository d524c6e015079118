use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Invalid Solana address format: {0}")]
    InvalidAddress(String),

    #[error("Chain RPC unavailable: {0}")]
    ChainUnavailable(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{entity} is required for {intent}")]
    MissingEntity {
        intent: &'static str,
        entity: &'static str,
    },

    #[error("Unsupported query type: {0}")]
    UnsupportedIntent(String),

    #[error("Query is required and must be a non-empty string")]
    EmptyQuery,

    #[error("Could not understand the query. Please try rephrasing.")]
    UnrecognizedQuery,

    #[error("Language model error: {0}")]
    LanguageModel(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ExplorerError {
    /// Errors raised before any chain I/O happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::UnsupportedFilter(_)
                | Self::MissingEntity { .. }
                | Self::UnsupportedIntent(_)
                | Self::EmptyQuery
                | Self::UnrecognizedQuery
        )
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        ExplorerError::ChainUnavailable(err.to_string())
    }
}

pub type ExplorerResult<T> = Result<T, ExplorerError>;
