//! Output line adapters.
//!
//! - [`SimulatedGpio`] keeps line levels in memory and logs every change.
//!   The host binary runs on it.
//! - [`HalOutputBank`] drives a set of `embedded-hal` output pins, one per
//!   physical identifier, when the engine runs on real hardware.

use std::collections::{BTreeMap, HashMap};

use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, warn};

use crate::app::ports::{OutputError, OutputPort};
use crate::pins::{Level, PhysicalId};

// ── Simulation ────────────────────────────────────────────────

/// In-memory output lines.  Every identifier is available.
#[derive(Debug, Default)]
pub struct SimulatedGpio {
    outputs: HashMap<PhysicalId, Level>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of `id` if it is currently an output.
    pub fn level(&self, id: PhysicalId) -> Option<Level> {
        self.outputs.get(&id).copied()
    }

    /// Number of lines currently in output mode.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

impl OutputPort for SimulatedGpio {
    fn configure_as_output(&mut self, id: PhysicalId, initial: Level) -> Result<(), OutputError> {
        debug!("SIM GPIO | {} output, initial {}", id, initial);
        self.outputs.insert(id, initial);
        Ok(())
    }

    fn write(&mut self, id: PhysicalId, level: Level) -> Result<(), OutputError> {
        match self.outputs.get_mut(&id) {
            Some(current) => {
                debug!("SIM GPIO | {} <- {}", id, level);
                *current = level;
                Ok(())
            }
            None => Err(OutputError::NotConfigured),
        }
    }

    fn release_to_input(&mut self, id: PhysicalId) -> Result<(), OutputError> {
        debug!("SIM GPIO | {} input", id);
        self.outputs.remove(&id);
        Ok(())
    }
}

// ── embedded-hal ──────────────────────────────────────────────

/// A bank of `embedded-hal` output pins addressed by [`PhysicalId`].
///
/// `embedded-hal` has no portable way to switch a pin to input, so
/// releasing a line drives it LOW (relay de-energised) and stops
/// accepting writes until it is configured again.
pub struct HalOutputBank<P: OutputPin> {
    pins: BTreeMap<PhysicalId, P>,
    active: BTreeMap<PhysicalId, Level>,
}

impl<P: OutputPin> Default for HalOutputBank<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin> HalOutputBank<P> {
    pub fn new() -> Self {
        Self {
            pins: BTreeMap::new(),
            active: BTreeMap::new(),
        }
    }

    /// Attach the pin that backs `id`, replacing any earlier one.
    pub fn attach(&mut self, id: PhysicalId, pin: P) {
        self.active.remove(&id);
        self.pins.insert(id, pin);
    }

    /// Level last driven on `id`, if it is configured.
    pub fn level(&self, id: PhysicalId) -> Option<Level> {
        self.active.get(&id).copied()
    }

    fn drive(&mut self, id: PhysicalId, level: Level) -> Result<(), OutputError> {
        let pin = self.pins.get_mut(&id).ok_or(OutputError::Unsupported)?;
        pin.set_state(PinState::from(level)).map_err(|e| {
            warn!("HAL GPIO | {} write failed: {:?}", id, e);
            OutputError::GpioFailed
        })
    }
}

impl<P: OutputPin> OutputPort for HalOutputBank<P> {
    fn configure_as_output(&mut self, id: PhysicalId, initial: Level) -> Result<(), OutputError> {
        self.drive(id, initial)?;
        self.active.insert(id, initial);
        Ok(())
    }

    fn write(&mut self, id: PhysicalId, level: Level) -> Result<(), OutputError> {
        if !self.active.contains_key(&id) {
            return Err(OutputError::NotConfigured);
        }
        self.drive(id, level)?;
        self.active.insert(id, level);
        Ok(())
    }

    fn release_to_input(&mut self, id: PhysicalId) -> Result<(), OutputError> {
        if self.active.remove(&id).is_none() {
            return Ok(());
        }
        self.drive(id, Level::Low)
    }
}
