//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PropService (domain)
//! ```
//!
//! Driven adapters (output lines, settings cache, clock, bus transport)
//! implement these traits.  The [`PropService`](super::service::PropService)
//! consumes them via generics, so the domain core never touches hardware,
//! files or sockets directly.

use crate::pins::{Level, PhysicalId};

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → relay lines)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive output lines.
pub trait OutputPort {
    /// Put `id` in output mode, driving `initial` immediately.
    fn configure_as_output(&mut self, id: PhysicalId, initial: Level) -> Result<(), OutputError>;

    /// Drive an already-configured line.
    fn write(&mut self, id: PhysicalId, level: Level) -> Result<(), OutputError>;

    /// Return the line to a safe input / high-impedance mode.
    fn release_to_input(&mut self, id: PhysicalId) -> Result<(), OutputError>;
}

// ───────────────────────────────────────────────────────────────
// Cache port (driven adapter: domain ↔ last-known-good settings)
// ───────────────────────────────────────────────────────────────

/// Local copy of the last remote wiring document.
///
/// Reads and writes are bounded and synchronous.  Any failure is treated
/// by the caller as "cache unavailable".
pub trait CacheStore {
    /// The cached document, or `Ok(None)` if nothing was ever cached.
    fn read_cached_document(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the cached document with `data`.
    fn write_cached_document(&mut self, data: &[u8]) -> Result<(), StorageError>;

    /// Modification time of the cached document, seconds since the Unix epoch.
    fn cached_document_timestamp(&self) -> Option<u64>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for `settings-date`.
pub trait ClockPort {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → bus / log)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, the
/// prop's outbox topic, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → message bus)
// ───────────────────────────────────────────────────────────────

/// Publish side of the message bus.  Connection lifecycle, retained
/// messages and subscriptions belong to the adapter.
pub trait Transport {
    fn publish(&mut self, topic: &str, text: &str) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
pub trait SchedulerDelegate {
    /// * `label` — the label of the schedule that fired.
    /// * `kind`  — whether it was a periodic or one-shot fire.
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// A recurring periodic schedule fired.
    Periodic,
    /// A one-shot schedule fired (auto-disables after).
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`OutputPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// The adapter has no driver for this line.
    Unsupported,
    /// The line was never configured as an output.
    NotConfigured,
    /// The underlying GPIO call failed.
    GpioFailed,
}

/// Errors from [`CacheStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Generic I/O error from the storage backend.
    IoError,
    /// Stored document exceeds the size limit.
    TooLarge,
}

/// Errors from [`Transport::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    IoError,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "line not supported"),
            Self::NotConfigured => write!(f, "line not configured"),
            Self::GpioFailed => write!(f, "GPIO call failed"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IoError => write!(f, "I/O error"),
            Self::TooLarge => write!(f, "document too large"),
        }
    }
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for OutputError {}
impl std::error::Error for StorageError {}
impl std::error::Error for TransportError {}
