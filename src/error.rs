//! Error types for the invocation relayer

use crate::types::Fixed8;
use thiserror::Error;

/// Main error type for the relayer
#[derive(Error, Debug)]
pub enum RelayerError {
    #[error("Insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: Fixed8, required: Fixed8 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Asset {asset} not found in address balances")]
    AssetNotFound { asset: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),
}

impl RelayerError {
    /// Check if error is retryable
    ///
    /// Nothing in the pipeline acts on this; it only tags the log line.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayerError::Transport(_))
    }
}

impl From<reqwest::Error> for RelayerError {
    fn from(e: reqwest::Error) -> Self {
        RelayerError::Transport(e.to_string())
    }
}

/// Result type for relayer operations
pub type RelayerResult<T> = Result<T, RelayerError>;
