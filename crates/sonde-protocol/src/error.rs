//! Error types for sensor shell command and reply handling

use thiserror::Error;

/// Errors that can occur while decoding a reply line
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line is not valid UTF-8 text
    #[error("reply is not valid text")]
    InvalidEncoding,

    /// Line does not start with the `VALUE=` preamble
    #[error("missing preamble in reply: {0:?}")]
    MissingPreamble(String),

    /// Line does not end with the `\r\n` terminator
    #[error("missing terminator in reply: {0:?}")]
    MissingTerminator(String),

    /// Nothing between preamble and terminator
    #[error("empty payload")]
    EmptyPayload,

    /// A field that should be a base-10 integer is not
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// I2C payload without the `high,low` separator
    #[error("missing separator in I2C payload: {0:?}")]
    MissingSeparator(String),

    /// I2C byte field outside 0-255
    #[error("byte out of range: {0}")]
    ByteOutOfRange(u32),
}

/// Errors for channel tokens that cannot be sent to the shell
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Empty channel token
    #[error("channel token is empty")]
    Empty,

    /// Channel token contains non-ASCII or line-control characters
    #[error("invalid channel token: {0:?}")]
    InvalidToken(String),
}
