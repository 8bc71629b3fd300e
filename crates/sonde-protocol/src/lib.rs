//! Sensor Shell Protocol Library
//!
//! This crate provides command encoding and reply decoding for the
//! line-oriented protocol spoken by the microcontroller "sensor shell":
//!
//! - **Commands**: the channel token itself (`A0`, `A10`, `i1`, ...), no framing
//! - **Replies**: one ASCII line, `VALUE=<payload>\r\n`
//! - **Analog payload**: a base-10 integer
//! - **I2C payload**: `high,low` (two base-10 bytes) or `-` when no device
//!   answered at the queried address
//!
//! The first character of the channel selects the decode path: `i` means
//! I2C, anything else is an analog pin.
//!
//! # Example
//!
//! ```rust
//! use sonde_protocol::{codec, Channel, SensorReading};
//!
//! let channel: Channel = "i1".parse().unwrap();
//! let line = b"VALUE=3,232\r\n";
//!
//! assert!(codec::is_line_complete(line));
//! let reading = codec::decode(&channel, line).unwrap();
//! assert_eq!(reading, SensorReading::I2c(1000));
//! assert_eq!(reading.value(), 1000);
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod reading;

pub use channel::{Channel, ChannelKind};
pub use codec::{decode, encode_command, encode_response, is_line_complete};
pub use error::{ChannelError, ParseError};
pub use reading::SensorReading;
