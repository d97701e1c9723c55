//! Command executor: drives resolved lines and picks the acknowledgement.

use core::fmt;

use log::{info, warn};

use crate::app::ports::OutputPort;
use crate::grammar::Resolution;
use crate::registry::PinRegistry;

/// Acknowledgement vocabulary for command messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The command matched at least one line.
    Done(String),
    /// The command was not understood or matched nothing.
    Omit(String),
}

impl Acknowledgement {
    pub fn message(&self) -> &str {
        match self {
            Self::Done(m) | Self::Omit(m) => m,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(m) => write!(f, "DONE {m}"),
            Self::Omit(m) => write!(f, "OMIT {m}"),
        }
    }
}

/// Apply `resolution` for the command `message`.
///
/// Every target is written even if an earlier write failed; the observed
/// level is only updated for lines that accepted the write.  `DONE` is
/// returned whenever at least one target was resolved.
pub fn execute(
    message: &str,
    resolution: &Resolution,
    registry: &mut PinRegistry,
    hw: &mut impl OutputPort,
) -> Acknowledgement {
    match resolution {
        Resolution::Targets { pins, level } => {
            for &id in pins {
                match hw.write(id, *level) {
                    Ok(()) => {
                        info!("{} set to {}", id, level);
                        if !registry.set_observed(id, *level) {
                            warn!("Prop data not found for {}", id);
                        }
                    }
                    Err(e) => warn!("Write to {} failed for '{}': {}", id, message, e),
                }
            }
            Acknowledgement::Done(message.to_owned())
        }
        Resolution::ResolutionEmpty { .. } => {
            warn!("No output found for: {}", message);
            Acknowledgement::Omit(message.to_owned())
        }
        Resolution::ParseFailure => {
            warn!("Command unknown in: {}", message);
            Acknowledgement::Omit(message.to_owned())
        }
    }
}
