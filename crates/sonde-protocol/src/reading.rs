//! Decoded sensor readings

use std::fmt;

/// The decoded result of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorReading {
    /// Analog pin value as reported by the shell
    Analog(u32),
    /// I2C sensor value: high byte * 256 + low byte
    I2c(u16),
    /// No I2C device answered at the queried address
    Absent,
}

impl SensorReading {
    /// Integer form of [`SensorReading::Absent`]
    pub const ABSENT_VALUE: i64 = -1;

    /// Build an I2C reading from its high (poids fort) and low (poids faible) bytes
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Self::I2c(u16::from_be_bytes([high, low]))
    }

    /// Integer form of the reading, `-1` for an absent I2C device
    pub fn value(&self) -> i64 {
        match self {
            Self::Analog(v) => i64::from(*v),
            Self::I2c(v) => i64::from(*v),
            Self::Absent => Self::ABSENT_VALUE,
        }
    }

    /// High and low bytes of an I2C reading
    pub fn bytes(&self) -> Option<(u8, u8)> {
        match self {
            Self::I2c(v) => {
                let [high, low] = v.to_be_bytes();
                Some((high, low))
            }
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<SensorReading> for i64 {
    fn from(reading: SensorReading) -> Self {
        reading.value()
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analog(v) => write!(f, "{}", v),
            Self::I2c(v) => write!(f, "{}", v),
            Self::Absent => f.write_str("absent"),
        }
    }
}
