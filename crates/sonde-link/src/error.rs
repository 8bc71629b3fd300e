//! Error types for the link and query layers

use sonde_detect::DetectError;
use sonde_protocol::{ChannelError, ParseError};
use thiserror::Error;

/// Errors from detecting, opening and closing the serial link
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Detection completed without a matching board
    #[error("no device with vendor id 0x{vendor_id:04X} found")]
    NoDeviceFound { vendor_id: u16 },

    /// Port enumeration failed
    #[error("detection failed: {0}")]
    Detect(#[from] DetectError),

    /// The link could not be opened
    #[error("failed to open port {port}: {reason}")]
    PortOpenFailed { port: String, reason: String },

    /// The link did not close cleanly
    #[error("failed to close port {port}: {reason}")]
    PortCloseFailed { port: String, reason: String },

    /// A link is already held
    #[error("port {0} is already open")]
    AlreadyOpen(String),
}

/// Errors from raw reads and writes on the link
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Write attempted on a closed link, or the write itself failed
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Read attempted on a closed link, or the read itself failed
    #[error("read failed: {0}")]
    ReadFailed(String),
}

/// Errors from a single sensor query
#[derive(Debug, Error)]
pub enum QueryError {
    /// Channel token cannot be sent
    #[error("invalid channel: {0}")]
    InvalidChannel(#[from] ChannelError),

    /// Command could not be written
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// No terminated reply within the deadline
    #[error("no reply to {channel} within {timeout_ms}ms")]
    ReadTimeout { channel: String, timeout_ms: u64 },

    /// Reply did not match the expected shape
    #[error("malformed reply: {0}")]
    Parse(#[from] ParseError),
}
