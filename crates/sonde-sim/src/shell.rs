//! Virtual sensor shell
//!
//! Answers channel commands with protocol-accurate reply lines. Analog pins
//! read 0 and I2C addresses report no device until configured otherwise.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sonde_protocol::{codec, Channel, ChannelKind, SensorReading};
use tracing::{debug, warn};

/// How the shell answers one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelReply {
    /// A well-formed `VALUE=...\r\n` line
    Reading(SensorReading),
    /// Arbitrary bytes, for malformed or unterminated replies
    Raw(Vec<u8>),
    /// No reply at all, as if the board stopped responding
    Silent,
}

/// Configuration for creating a virtual shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualShellConfig {
    /// Display name/identifier
    pub id: String,
    /// Analog pin values by channel token
    #[serde(default)]
    pub analog: BTreeMap<String, u32>,
    /// Attached I2C sensors by channel token
    #[serde(default)]
    pub i2c: BTreeMap<String, u16>,
    /// Split replies into writes of this many bytes
    #[serde(default)]
    pub fragment_size: Option<usize>,
}

impl Default for VirtualShellConfig {
    fn default() -> Self {
        Self {
            id: "Virtual Shell".to_string(),
            analog: BTreeMap::new(),
            i2c: BTreeMap::new(),
            fragment_size: None,
        }
    }
}

/// A simulated sensor shell
#[derive(Debug, Clone)]
pub struct VirtualShell {
    id: String,
    replies: HashMap<String, ChannelReply>,
    delays: HashMap<String, Duration>,
    fragment_size: Option<usize>,
    received: Vec<String>,
}

impl VirtualShell {
    /// Create a shell with no configured channels
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            replies: HashMap::new(),
            delays: HashMap::new(),
            fragment_size: None,
            received: Vec::new(),
        }
    }

    /// Create a shell from configuration
    pub fn from_config(config: VirtualShellConfig) -> Self {
        let mut shell = Self::new(config.id);
        for (pin, value) in config.analog {
            shell.set_analog(pin, value);
        }
        for (address, value) in config.i2c {
            shell.attach_i2c(address, value);
        }
        shell.fragment_size = config.fragment_size;
        shell
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the value reported for an analog pin
    pub fn set_analog(&mut self, pin: impl Into<String>, value: u32) {
        self.replies
            .insert(pin.into(), ChannelReply::Reading(SensorReading::Analog(value)));
    }

    /// Attach an I2C sensor reporting the given value
    pub fn attach_i2c(&mut self, address: impl Into<String>, value: u16) {
        self.replies
            .insert(address.into(), ChannelReply::Reading(SensorReading::I2c(value)));
    }

    /// Remove an I2C sensor; the address reports no device again
    pub fn detach_i2c(&mut self, address: &str) {
        self.replies.remove(address);
    }

    /// Answer a channel with arbitrary bytes
    pub fn set_raw_reply(&mut self, channel: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.replies
            .insert(channel.into(), ChannelReply::Raw(bytes.into()));
    }

    /// Never answer a channel
    pub fn set_silent(&mut self, channel: impl Into<String>) {
        self.replies.insert(channel.into(), ChannelReply::Silent);
    }

    /// Hold back a channel's reply, as a slow sensor would
    pub fn set_reply_delay(&mut self, channel: impl Into<String>, delay: Duration) {
        self.delays.insert(channel.into(), delay);
    }

    /// How long the reply to a channel is held back
    pub fn reply_delay(&self, channel: &str) -> Duration {
        self.delays.get(channel).copied().unwrap_or_default()
    }

    /// Split replies into writes of `size` bytes (None sends whole lines)
    pub fn set_fragment_size(&mut self, size: Option<usize>) {
        self.fragment_size = size.filter(|s| *s > 0);
    }

    pub fn fragment_size(&self) -> Option<usize> {
        self.fragment_size
    }

    /// The configured or default reply for a channel
    pub fn reply_for(&self, channel: &Channel) -> ChannelReply {
        if let Some(reply) = self.replies.get(channel.as_str()) {
            return reply.clone();
        }
        match channel.kind() {
            ChannelKind::Analog => ChannelReply::Reading(SensorReading::Analog(0)),
            ChannelKind::I2c => ChannelReply::Reading(SensorReading::Absent),
        }
    }

    /// Handle one received command, returning the bytes to send back
    pub fn respond(&mut self, command: &[u8]) -> Option<Vec<u8>> {
        let token = String::from_utf8_lossy(command).trim().to_string();
        let channel = match Channel::new(token.as_str()) {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Virtual shell {} ignoring command {:?}: {}", self.id, token, e);
                return None;
            }
        };

        debug!("Virtual shell {} received {}", self.id, channel);
        self.received.push(token);

        match self.reply_for(&channel) {
            ChannelReply::Reading(reading) => Some(codec::encode_response(&reading)),
            ChannelReply::Raw(bytes) => Some(bytes),
            ChannelReply::Silent => None,
        }
    }

    /// Commands received so far, in order
    pub fn received(&self) -> &[String] {
        &self.received
    }
}
