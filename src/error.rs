//! Error types for the pool filter pipeline

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pool-guard
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // On-chain layout errors
    #[error("Account decode failed: {0}")]
    AccountDecode(String),

    // Remote risk service errors
    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Remote request timed out after {0}ms")]
    RemoteTimeout(u64),

    // Pipeline errors
    #[error("Invalid pool descriptor: {0}")]
    InvalidPool(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_) | Error::Remote(_) | Error::RemoteTimeout(_)
        )
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}
