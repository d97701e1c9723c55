//! Physical output identifiers and logic levels for the relay board.
//!
//! Single source of truth for how pin names in a wiring document map to
//! physical lines.  Two address spaces exist:
//!
//! - `GPIO<n>` — a header line driven directly by the host SoC.
//! - `MCP23017<bank><bit>` — a line behind the MCP23017 I²C expander
//!   (bank `A`/`B`, bit `0`–`7`).

use core::fmt;
use core::str::FromStr;

use embedded_hal::digital::PinState;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Reserved lines and address-space constants
// ---------------------------------------------------------------------------

/// Name prefix of directly driven header lines.
pub const GPIO_PREFIX: &str = "GPIO";
/// Name prefix of lines routed through the I²C expander.
pub const EXPANDER_PREFIX: &str = "MCP23017";

/// Highest BCM line number on the 40-pin header.
pub const GPIO_MAX_LINE: u8 = 27;

/// I²C data line.  Carries the expander bus when one is fitted.
pub const I2C_SDA_GPIO: u8 = 2;
/// I²C clock line.  Carries the expander bus when one is fitted.
pub const I2C_SCL_GPIO: u8 = 3;

// ---------------------------------------------------------------------------
// Logic level
// ---------------------------------------------------------------------------

/// Logic level of an output line.
///
/// On the wire a level is `0`/`1` (booleans are accepted on input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl From<Level> for PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(b) => Ok(Self::from(b)),
            Raw::Number(0) => Ok(Self::Low),
            Raw::Number(1) => Ok(Self::High),
            Raw::Number(n) => Err(serde::de::Error::custom(format!(
                "initial level must be 0 or 1, got {n}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Physical identifier
// ---------------------------------------------------------------------------

/// Expander port bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    A,
    B,
}

/// A physical output line, parsed from its wiring-document name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhysicalId {
    /// Header line driven by the SoC (BCM numbering).
    Gpio(u8),
    /// Line behind the I²C expander.
    Expander { bank: Bank, bit: u8 },
}

impl PhysicalId {
    /// Whether this line lives in the expander address space.
    pub const fn is_expander(&self) -> bool {
        matches!(self, Self::Expander { .. })
    }

    /// Whether this header line is claimed by the expander's I²C bus.
    pub const fn is_i2c_bus(&self) -> bool {
        matches!(self, Self::Gpio(n) if *n == I2C_SDA_GPIO || *n == I2C_SCL_GPIO)
    }
}

/// Reason a pin name could not be mapped to a [`PhysicalId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinParseError {
    /// Neither `GPIO` nor `MCP23017`.
    UnknownPrefix,
    /// Suffix is not a line number / bank+bit.
    BadSuffix,
    /// Line number outside the header range.
    OutOfRange,
}

impl fmt::Display for PinParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPrefix => write!(f, "unknown pin prefix"),
            Self::BadSuffix => write!(f, "malformed pin suffix"),
            Self::OutOfRange => write!(f, "pin number out of range"),
        }
    }
}

impl FromStr for PhysicalId {
    type Err = PinParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(EXPANDER_PREFIX) {
            let mut chars = rest.chars();
            let bank = match chars.next() {
                Some('A') => Bank::A,
                Some('B') => Bank::B,
                _ => return Err(PinParseError::BadSuffix),
            };
            let digits = chars.as_str();
            if digits.len() != 1 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PinParseError::BadSuffix);
            }
            let bit = digits.as_bytes()[0] - b'0';
            if bit > 7 {
                return Err(PinParseError::OutOfRange);
            }
            return Ok(Self::Expander { bank, bit });
        }

        if let Some(rest) = s.strip_prefix(GPIO_PREFIX) {
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PinParseError::BadSuffix);
            }
            let line: u8 = rest.parse().map_err(|_| PinParseError::OutOfRange)?;
            if line > GPIO_MAX_LINE {
                return Err(PinParseError::OutOfRange);
            }
            return Ok(Self::Gpio(line));
        }

        Err(PinParseError::UnknownPrefix)
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(n) => write!(f, "{GPIO_PREFIX}{n}"),
            Self::Expander { bank, bit } => write!(f, "{EXPANDER_PREFIX}{bank:?}{bit}"),
        }
    }
}
