//! Error taxonomy for settings reconciliation.
//!
//! None of these are fatal.  A [`DecodeError`] leaves the settings state at
//! `NONE`; a [`RecordError`] is counted by the registry and turns a
//! successful load into an `*_ERROR` status.  Command-level failures are
//! not errors at all: they are variants of
//! [`Resolution`](crate::grammar::Resolution).

use core::fmt;

use crate::app::ports::OutputError;
use crate::pins::PinParseError;

// ---------------------------------------------------------------------------
// Document decode errors
// ---------------------------------------------------------------------------

/// A wiring document could not be decoded at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// The raw payload as received (lossy UTF-8).
    pub payload: String,
    /// Human-readable parser message.
    pub message: String,
    /// Byte offset of the failure within `payload`, when the parser knows it.
    pub offset: Option<usize>,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(pos) => write!(f, "{} at {} in: {}", self.message, pos, self.payload),
            None => write!(f, "{} in: {}", self.message, self.payload),
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// Per-record errors
// ---------------------------------------------------------------------------

/// Why a single record of an otherwise well-formed document was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorKind {
    /// `pin` does not name a physical line.
    UnknownPin(PinParseError),
    /// `variable` is empty.
    EmptyVariable,
    /// `variable` contains the command separator or the wildcard suffix, or
    /// is one of the built-in data item names.
    ReservedVariable,
    /// `variable` or an alias label exceeds its fixed capacity.
    LabelTooLong,
    /// The output collaborator refused to configure the line.
    Hardware(OutputError),
}

impl fmt::Display for RecordErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPin(e) => write!(f, "{e}"),
            Self::EmptyVariable => write!(f, "empty variable"),
            Self::ReservedVariable => write!(f, "variable is reserved"),
            Self::LabelTooLong => write!(f, "label too long"),
            Self::Hardware(e) => write!(f, "line setup failed: {e}"),
        }
    }
}

/// A rejected record, with enough context to log it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// Position of the record within the document.
    pub index: usize,
    /// The record's `pin` field as written.
    pub pin: String,
    pub kind: RecordErrorKind,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record #{} ({}): {}", self.index, self.pin, self.kind)
    }
}

impl std::error::Error for RecordError {}

impl From<PinParseError> for RecordErrorKind {
    fn from(e: PinParseError) -> Self {
        Self::UnknownPin(e)
    }
}

impl From<OutputError> for RecordErrorKind {
    fn from(e: OutputError) -> Self {
        Self::Hardware(e)
    }
}
