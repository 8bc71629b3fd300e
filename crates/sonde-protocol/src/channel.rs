//! Channel tokens
//!
//! A channel names the sensor to query. The shell treats the token as the
//! whole command, so a channel is also the exact bytes written to the wire.

use std::fmt;
use std::str::FromStr;

use crate::error::ChannelError;

/// Leading character that selects the I2C decode path
pub const I2C_PREFIX: char = 'i';

/// Which decode path a channel's reply follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelKind {
    /// Analog pin, plain integer reply
    Analog,
    /// I2C address, two-byte reply or absence marker
    I2c,
}

/// A validated channel token (`A0`, `A10`, `i1`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Channel(String);

impl Channel {
    /// Create a channel from a token
    ///
    /// The token must be non-empty printable ASCII. Line control characters
    /// are rejected since they would corrupt the shell's reply framing.
    pub fn new(token: impl Into<String>) -> Result<Self, ChannelError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ChannelError::Empty);
        }
        if !token.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(ChannelError::InvalidToken(token));
        }
        Ok(Self(token))
    }

    /// Decode path selected by the first character
    pub fn kind(&self) -> ChannelKind {
        if self.0.starts_with(I2C_PREFIX) {
            ChannelKind::I2c
        } else {
            ChannelKind::Analog
        }
    }

    /// Returns true if this channel addresses an I2C sensor
    pub fn is_i2c(&self) -> bool {
        self.kind() == ChannelKind::I2c
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for Channel {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Channel {
    type Error = ChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Channel {
    type Error = ChannelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
