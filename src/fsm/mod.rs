//! Settings state machine.
//!
//! Decides which wiring document is authoritative (the one pushed on the
//! settings topic, or the local cache of the last one) and records where
//! the applied configuration came from.
//!
//! ```text
//!              ┌──────────── remote doc ok ────────────▶ OK
//!              │
//!   NONE ──────┼──────── remote doc, failures ───────▶ ONLINE ERROR
//!    ▲         │
//!    │         ├── rescue timer, cache ok ───────────▶ OFFLINE
//!    │         │
//!    │         └── rescue timer, cache w/ failures ──▶ OFFLINE ERROR
//!    │
//!    └───────── any new remote doc (reset: status, date, registry) ◀── any
//! ```
//!
//! An undecodable remote document, an absent cache and an undecodable
//! cache all leave the machine in `NONE`.

pub mod context;

use core::fmt;

use context::SettingsSnapshot;
use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{CacheStore, ClockPort, EventSink, OutputPort};
use crate::codec;
use crate::registry::{ExpanderPolicy, PinRegistry};

// ---------------------------------------------------------------------------
// Status identity
// ---------------------------------------------------------------------------

/// Provenance of the applied wiring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SettingsStatus {
    /// Nothing applied (initial, and transient during a reload).
    None = 0,
    /// Applied from the local cache.
    Offline = 1,
    /// Applied from the local cache with record failures.
    OfflineError = 2,
    /// Applied from a remote document with record failures.
    OnlineError = 3,
    /// Applied from a remote document.
    Ok = 4,
}

impl SettingsStatus {
    /// Name published in `DATA`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Offline => "OFFLINE",
            Self::OfflineError => "OFFLINE ERROR",
            Self::OnlineError => "ONLINE ERROR",
            Self::Ok => "OK",
        }
    }

    /// Whether a document is currently applied.
    pub const fn is_applied(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for SettingsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Owns the settings state and is the only caller of registry rebuilds.
#[derive(Debug)]
pub struct SettingsMachine {
    state: SettingsSnapshot,
    policy: ExpanderPolicy,
    rescue_done: bool,
}

impl SettingsMachine {
    pub fn new(policy: ExpanderPolicy) -> Self {
        Self {
            state: SettingsSnapshot::initial(),
            policy,
            rescue_done: false,
        }
    }

    pub fn status(&self) -> SettingsStatus {
        self.state.status
    }

    pub fn last_applied_at(&self) -> Option<u64> {
        self.state.last_applied_at
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        self.state
    }

    /// Whether the startup rescue has already run.
    pub fn rescue_done(&self) -> bool {
        self.rescue_done
    }

    /// A wiring document arrived on the settings topic.
    ///
    /// The raw bytes are cached whenever they decode, even if some records
    /// fail to apply.
    pub fn on_remote_document(
        &mut self,
        bytes: &[u8],
        registry: &mut PinRegistry,
        hw: &mut impl OutputPort,
        cache: &mut impl CacheStore,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> SettingsStatus {
        self.reset(registry, hw, sink);

        let document = match codec::decode(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                error!(
                    "Settings: decode error '{}' at {:?} in: {}",
                    e.message, e.offset, e.payload
                );
                return self.state.status;
            }
        };

        let report = registry.apply(&document, self.policy, hw);

        if let Err(e) = cache.write_cached_document(bytes) {
            warn!("Settings: failed to cache remote settings: {}", e);
        }

        let next = if report.failures() > 0 {
            SettingsStatus::OnlineError
        } else {
            SettingsStatus::Ok
        };
        self.transition(next, Some(clock.now()), sink);
        next
    }

    /// The one-shot rescue timer fired.
    ///
    /// Falls back to the cached document only if no remote document has
    /// been applied yet.  Runs at most once per machine.
    pub fn on_startup_rescue(
        &mut self,
        registry: &mut PinRegistry,
        hw: &mut impl OutputPort,
        cache: &impl CacheStore,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> SettingsStatus {
        if self.rescue_done {
            return self.state.status;
        }
        self.rescue_done = true;

        if self.state.last_applied_at.is_some() {
            info!("Settings: remote settings already applied, rescue skipped");
            return self.state.status;
        }

        self.reset(registry, hw, sink);

        let bytes = match cache.read_cached_document() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!("Settings: no cached settings to rescue");
                return self.state.status;
            }
            Err(e) => {
                warn!("Settings: cached settings unavailable: {}", e);
                return self.state.status;
            }
        };

        let document = match codec::decode(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                error!(
                    "Settings: cached settings decode error '{}' at {:?}",
                    e.message, e.offset
                );
                return self.state.status;
            }
        };

        let report = registry.apply(&document, self.policy, hw);
        let next = if report.failures() > 0 {
            SettingsStatus::OfflineError
        } else {
            SettingsStatus::Offline
        };
        let date = cache.cached_document_timestamp().unwrap_or_else(|| {
            warn!("Settings: cache has no timestamp, using current time");
            clock.now()
        });
        self.transition(next, Some(date), sink);
        next
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Back to `NONE` with an empty registry, announced before any new
    /// outcome is computed.
    fn reset(
        &mut self,
        registry: &mut PinRegistry,
        hw: &mut impl OutputPort,
        sink: &mut impl EventSink,
    ) {
        self.transition(SettingsStatus::None, None, sink);
        registry.clear(hw);
    }

    fn transition(
        &mut self,
        next: SettingsStatus,
        date: Option<u64>,
        sink: &mut impl EventSink,
    ) {
        debug_assert!(
            !self.state.status.is_applied() || !next.is_applied(),
            "settings must pass through NONE between two applied states"
        );

        info!("Settings transition: {} -> {}", self.state.status, next);
        self.state = SettingsSnapshot {
            status: next,
            last_applied_at: date,
        };
        sink.emit(&AppEvent::SettingsChanged(self.state));
    }
}
