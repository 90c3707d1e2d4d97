//! Error types for the mint runner

use crate::chain::Network;

use thiserror::Error;

/// Main error type for the runner
#[derive(Error, Debug)]
pub enum MinterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC error on {network}: {message}")]
    Rpc { network: Network, message: String },

    #[error("Contract call error: {0}")]
    Contract(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("No RPC endpoint configured for {network}")]
    NoEndpoint { network: Network },
}

impl MinterError {
    /// Check if error is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MinterError::Rpc { .. }
                | MinterError::Contract(_)
                | MinterError::GasEstimation(_)
                | MinterError::Timeout { .. }
        )
    }
}

/// Result type for runner operations
pub type MinterResult<T> = Result<T, MinterError>;
