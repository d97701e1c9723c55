//! Wiring document codec.
//!
//! Wire format (UTF-8 JSON):
//! ```text
//! [
//!   {"pin": "GPIO17", "variable": "lamp", "initial": 0, "alias": ["on", "off"]},
//!   {"pin": "MCP23017A0", "variable": "door/strike", "initial": 1, "alias": ["close", "open"]}
//! ]
//! ```
//!
//! Decoding only checks shape and field types.  Whether a record names a
//! real line or a usable variable is decided by
//! [`PinRegistry::apply`](crate::registry::PinRegistry::apply).

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::pins::Level;

/// One wiring record.  Field order here is the encoded field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub pin: String,
    pub variable: String,
    pub initial: Level,
    /// `(high, low)` labels.
    pub alias: (String, String),
}

impl ConfigRecord {
    pub fn new(pin: &str, variable: &str, initial: Level, alias: (&str, &str)) -> Self {
        Self {
            pin: pin.to_owned(),
            variable: variable.to_owned(),
            initial,
            alias: (alias.0.to_owned(), alias.1.to_owned()),
        }
    }
}

impl fmt::Display for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: variable='{}' initial='{}' values=('{}', '{}')",
            self.pin, self.variable, self.initial, self.alias.0, self.alias.1
        )
    }
}

/// An ordered wiring document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub records: Vec<ConfigRecord>,
}

/// Parse a wiring document.
pub fn decode(bytes: &[u8]) -> Result<Document, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError {
        payload: String::from_utf8_lossy(bytes).into_owned(),
        message: e.to_string(),
        offset: byte_offset(bytes, e.line(), e.column()),
    })
}

/// Serialise a document.  Output is deterministic for a given document.
pub fn encode(document: &Document) -> Vec<u8> {
    // Plain strings, integers and tuples cannot fail to serialise.
    serde_json::to_vec(document).unwrap_or_default()
}

/// Convert serde_json's 1-based line/column into a byte offset.
/// Line 0 means the parser had no position (e.g. a type error at EOF).
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start = if line == 1 {
        0
    } else {
        bytes
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)?
    };
    Some((line_start + column.saturating_sub(1)).min(bytes.len()))
}
