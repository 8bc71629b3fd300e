//! Sensor shell line codec
//!
//! # Format
//! - Command: the channel token, written as-is (no terminator)
//! - Reply: `VALUE=<payload>\r\n`
//! - Framing: a reply is complete once the last received byte is `\n`;
//!   there is no length prefix
//!
//! # Payloads
//! - Analog: `123`
//! - I2C, device present: `3,232` (high byte, low byte)
//! - I2C, no device: `-` (any payload starting with `-`)

use crate::channel::{Channel, ChannelKind};
use crate::error::ParseError;
use crate::reading::SensorReading;

/// Literal that opens every reply line
pub const PREAMBLE: &str = "VALUE=";

/// Literal that closes every reply line
pub const TERMINATOR: &str = "\r\n";

/// Byte that marks the end of a reply
pub const LINE_FEED: u8 = b'\n';

/// I2C payload sent when no device answered
pub const ABSENT_MARKER: &str = "-";

/// Separator between the I2C high and low bytes
pub const BYTE_SEPARATOR: char = ',';

/// Encode the wire command for a channel
pub fn encode_command(channel: &Channel) -> Vec<u8> {
    channel.as_bytes().to_vec()
}

/// Returns true if the accumulated bytes end with the line feed terminator
pub fn is_line_complete(buffer: &[u8]) -> bool {
    buffer.last() == Some(&LINE_FEED)
}

/// Decode a complete reply line for the given channel
pub fn decode(channel: &Channel, raw_line: &[u8]) -> Result<SensorReading, ParseError> {
    let line = std::str::from_utf8(raw_line).map_err(|_| ParseError::InvalidEncoding)?;
    tracing::trace!("Decoding {} reply {:?}", channel, line);
    let payload = payload(line)?;

    match channel.kind() {
        ChannelKind::Analog => parse_decimal::<u32>(payload).map(SensorReading::Analog),
        ChannelKind::I2c => decode_i2c(payload),
    }
}

/// Encode a reply line the way the shell would send it
pub fn encode_response(reading: &SensorReading) -> Vec<u8> {
    let payload = match reading {
        SensorReading::Analog(v) => v.to_string(),
        SensorReading::I2c(v) => {
            let [high, low] = v.to_be_bytes();
            format!("{}{}{}", high, BYTE_SEPARATOR, low)
        }
        SensorReading::Absent => ABSENT_MARKER.to_string(),
    };
    format!("{}{}{}", PREAMBLE, payload, TERMINATOR).into_bytes()
}

/// Extract the payload between preamble and terminator
fn payload(line: &str) -> Result<&str, ParseError> {
    let rest = line
        .strip_prefix(PREAMBLE)
        .ok_or_else(|| ParseError::MissingPreamble(line.into()))?;
    let payload = rest
        .strip_suffix(TERMINATOR)
        .ok_or_else(|| ParseError::MissingTerminator(line.into()))?;

    if payload.is_empty() {
        return Err(ParseError::EmptyPayload);
    }
    Ok(payload)
}

fn decode_i2c(payload: &str) -> Result<SensorReading, ParseError> {
    // Only the first character is significant for the absence marker
    if payload.starts_with(ABSENT_MARKER) {
        return Ok(SensorReading::Absent);
    }

    let (high, low) = payload
        .split_once(BYTE_SEPARATOR)
        .ok_or_else(|| ParseError::MissingSeparator(payload.into()))?;

    Ok(SensorReading::from_bytes(parse_byte(high)?, parse_byte(low)?))
}

fn parse_byte(field: &str) -> Result<u8, ParseError> {
    let value = parse_decimal::<u32>(field)?;
    u8::try_from(value).map_err(|_| ParseError::ByteOutOfRange(value))
}

/// Parse an unsigned base-10 field, digits only (no sign, no whitespace)
fn parse_decimal<T: std::str::FromStr>(field: &str) -> Result<T, ParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidNumber(field.into()));
    }
    field
        .parse::<T>()
        .map_err(|_| ParseError::InvalidNumber(field.into()))
}
