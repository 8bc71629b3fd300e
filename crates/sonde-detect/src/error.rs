//! Error types for port detection

use thiserror::Error;

/// Errors raised while looking for the board
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate serial ports
    #[error("could not list serial ports: {0}")]
    EnumerationFailed(String),
}
