//! Pin registry — the live set of configured output pins.
//!
//! The registry is rebuilt wholesale from one wiring document at a time:
//! [`PinRegistry::apply`] always starts from an empty registry, so it is
//! either empty or reflects exactly one document.  Descriptors keep the
//! document order; two derived indexes serve command resolution:
//!
//! ```text
//!   by_variable : "door/strike" ─▶ MCP23017A0     (first inserted wins)
//!   by_group    : "door"        ─▶ [MCP23017A0, GPIO17]
//! ```

use std::collections::HashMap;

use log::{error, info, warn};

use crate::app::ports::OutputPort;
use crate::codec::{ConfigRecord, Document};
use crate::config::Board;
use crate::error::{RecordError, RecordErrorKind};
use crate::grammar::{SEPARATOR, WILDCARD_SUFFIX};
use crate::pins::{Level, PhysicalId};

/// Capacity of a variable name (bytes).
pub const VARIABLE_CAPACITY: usize = 32;
/// Capacity of an alias label (bytes).
pub const LABEL_CAPACITY: usize = 18;

/// Data item names published ahead of the pins; no pin may use them.
pub const RESERVED_VARIABLES: [&str; 3] = ["board", "settings", "settings-date"];

pub type Variable = heapless::String<VARIABLE_CAPACITY>;
pub type Label = heapless::String<LABEL_CAPACITY>;

fn bounded<const N: usize>(s: &str) -> Option<heapless::String<N>> {
    let mut out = heapless::String::new();
    out.push_str(s).ok()?;
    Some(out)
}

// ---------------------------------------------------------------------------
// Alias pair
// ---------------------------------------------------------------------------

/// Display labels for a pin's HIGH and LOW levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPair {
    high: Label,
    low: Label,
}

impl AliasPair {
    /// `None` if either label exceeds [`LABEL_CAPACITY`].
    pub fn new(high: &str, low: &str) -> Option<Self> {
        Some(Self {
            high: bounded(high)?,
            low: bounded(low)?,
        })
    }

    pub fn high(&self) -> &str {
        &self.high
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn label_for(&self, level: Level) -> &str {
        match level {
            Level::High => &self.high,
            Level::Low => &self.low,
        }
    }
}

// ---------------------------------------------------------------------------
// Pin descriptor
// ---------------------------------------------------------------------------

/// One configured output pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinDescriptor {
    id: PhysicalId,
    variable: Variable,
    initial: Level,
    alias: AliasPair,
    observed: Level,
}

impl PinDescriptor {
    pub fn id(&self) -> PhysicalId {
        self.id
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn initial(&self) -> Level {
        self.initial
    }

    pub fn alias(&self) -> &AliasPair {
        &self.alias
    }

    /// Level last driven onto the line.
    pub fn observed(&self) -> Level {
        self.observed
    }

    /// Alias label for the observed level, as published in `DATA`.
    pub fn observed_label(&self) -> &str {
        self.alias.label_for(self.observed)
    }

    /// Build a descriptor from a document record, validating its fields.
    fn from_record(id: PhysicalId, record: &ConfigRecord) -> Result<Self, RecordErrorKind> {
        if record.variable.is_empty() {
            return Err(RecordErrorKind::EmptyVariable);
        }
        if record.variable.contains(SEPARATOR)
            || record.variable.ends_with(WILDCARD_SUFFIX)
            || RESERVED_VARIABLES.contains(&record.variable.as_str())
        {
            return Err(RecordErrorKind::ReservedVariable);
        }
        let variable = bounded(&record.variable).ok_or(RecordErrorKind::LabelTooLong)?;
        let alias = AliasPair::new(&record.alias.0, &record.alias.1)
            .ok_or(RecordErrorKind::LabelTooLong)?;

        Ok(Self {
            id,
            variable,
            initial: record.initial,
            alias,
            observed: record.initial,
        })
    }
}

// ---------------------------------------------------------------------------
// Expander policy
// ---------------------------------------------------------------------------

/// Which records a board can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpanderPolicy {
    /// Bare board: expander lines do not exist.
    Absent,
    /// Expander fitted: its I²C bus lines are not available as outputs.
    Present,
}

impl ExpanderPolicy {
    /// Whether a record for `id` is skipped on this board.
    pub fn excludes(self, id: PhysicalId) -> bool {
        match self {
            Self::Absent => id.is_expander(),
            Self::Present => id.is_i2c_bus(),
        }
    }
}

impl From<Board> for ExpanderPolicy {
    fn from(board: Board) -> Self {
        match board {
            Board::Pi => Self::Absent,
            Board::PiMcp23017 => Self::Present,
        }
    }
}

// ---------------------------------------------------------------------------
// Apply report
// ---------------------------------------------------------------------------

/// Outcome of [`PinRegistry::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Records turned into descriptors.
    pub applied: usize,
    /// Records skipped by the expander policy.
    pub ignored: usize,
    /// Records rejected.
    pub errors: Vec<RecordError>,
}

impl ApplyReport {
    pub fn failures(&self) -> usize {
        self.errors.len()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PinRegistry {
    /// Descriptors in document order.  Physical ids are unique.
    pins: Vec<PinDescriptor>,
    by_variable: HashMap<String, PhysicalId>,
    by_group: HashMap<String, Vec<PhysicalId>>,
}

impl PinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Descriptors in document order.
    pub fn iter(&self) -> impl Iterator<Item = &PinDescriptor> {
        self.pins.iter()
    }

    pub fn descriptor_for(&self, id: PhysicalId) -> Option<&PinDescriptor> {
        self.pins.iter().find(|p| p.id == id)
    }

    /// Exact variable lookup.  With duplicate variables the first inserted
    /// descriptor is returned.
    pub fn lookup_variable(&self, variable: &str) -> Option<&PinDescriptor> {
        self.by_variable
            .get(variable)
            .and_then(|id| self.descriptor_for(*id))
    }

    /// Every descriptor whose variable starts with `"<group>/"`, in
    /// document order.
    pub fn lookup_group(&self, group: &str) -> Vec<&PinDescriptor> {
        self.by_group
            .get(group)
            .map(|ids| ids.iter().filter_map(|id| self.descriptor_for(*id)).collect())
            .unwrap_or_default()
    }

    /// Record the level just written to `id`.  Returns `false` if the pin
    /// is not registered.
    pub fn set_observed(&mut self, id: PhysicalId, level: Level) -> bool {
        match self.pins.iter_mut().find(|p| p.id == id) {
            Some(pin) => {
                pin.observed = level;
                true
            }
            None => false,
        }
    }

    /// Release every line to input and forget all descriptors.
    ///
    /// Best-effort: a line that fails to release is logged and the rest
    /// are still released.  No-op on an empty registry.
    pub fn clear(&mut self, hw: &mut impl OutputPort) {
        for pin in &self.pins {
            match hw.release_to_input(pin.id) {
                Ok(()) => info!("Cleanup {} (set as input)", pin.id),
                Err(e) => error!("Cleanup failed for {}: {}", pin.id, e),
            }
        }
        self.pins.clear();
        self.by_variable.clear();
        self.by_group.clear();
    }

    /// Rebuild the registry from `document`.
    ///
    /// Each record is handled on its own: records excluded by `policy` are
    /// ignored, malformed records and lines the hardware refuses are
    /// counted as failures, everything else becomes a descriptor.
    pub fn apply(
        &mut self,
        document: &Document,
        policy: ExpanderPolicy,
        hw: &mut impl OutputPort,
    ) -> ApplyReport {
        self.clear(hw);
        let mut report = ApplyReport::default();

        for (index, record) in document.records.iter().enumerate() {
            match self.apply_record(record, policy, hw) {
                Ok(true) => report.applied += 1,
                Ok(false) => report.ignored += 1,
                Err(kind) => {
                    let err = RecordError {
                        index,
                        pin: record.pin.clone(),
                        kind,
                    };
                    warn!("Failed to add pin from settings: {}", err);
                    report.errors.push(err);
                }
            }
        }

        self.rebuild_indexes();
        info!(
            "Registry: {} pins applied, {} ignored, {} failed",
            report.applied,
            report.ignored,
            report.failures()
        );
        report
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// `Ok(true)` when inserted, `Ok(false)` when ignored by policy.
    fn apply_record(
        &mut self,
        record: &ConfigRecord,
        policy: ExpanderPolicy,
        hw: &mut impl OutputPort,
    ) -> Result<bool, RecordErrorKind> {
        let id: PhysicalId = record.pin.parse()?;
        if policy.excludes(id) {
            info!("Pin ignored from settings: {}", record);
            return Ok(false);
        }

        let descriptor = PinDescriptor::from_record(id, record)?;
        hw.configure_as_output(id, descriptor.initial)?;
        info!("{} set as output (initial={})", id, descriptor.initial);

        if let Some(existing) = self.pins.iter_mut().find(|p| p.id == id) {
            warn!("Pin {} listed twice in settings, keeping the later record", id);
            *existing = descriptor;
        } else {
            self.pins.push(descriptor);
        }
        info!("Pin added from settings: {}", record);
        Ok(true)
    }

    fn rebuild_indexes(&mut self) {
        self.by_variable.clear();
        self.by_group.clear();

        for pin in &self.pins {
            let variable = pin.variable.as_str();
            if let Some(first) = self.by_variable.get(variable) {
                warn!(
                    "Variable '{}' used by both {} and {}, commands address {}",
                    variable, first, pin.id, first
                );
            } else {
                self.by_variable.insert(variable.to_owned(), pin.id);
            }

            for (pos, _) in variable.match_indices('/') {
                self.by_group
                    .entry(variable[..pos].to_owned())
                    .or_default()
                    .push(pin.id);
            }
        }
    }
}
