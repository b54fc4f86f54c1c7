//! Error types for the RL core library

use thiserror::Error;

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Agent-related errors
    #[error("Agent error: {0}")]
    Agent(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Width the receiver was built for
        expected: usize,
        /// Width it was given
        actual: usize,
    },

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Checkpoint missing or unreadable
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Invalid training configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RLError {
    /// Fail with [`RLError::DimensionMismatch`] unless `actual == expected`.
    pub fn check_dim(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, actual })
        }
    }
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
