//! Command grammar.
//!
//! ```text
//!   message   := predicate ":" action
//!   predicate := variable | group "/*"
//!   action    := "1" | "0" | synonym
//! ```
//!
//! Parsing and resolution happen in one pass against the
//! [`PinRegistry`]: the result names the concrete lines to drive, or says
//! why there are none.

use log::info;

use crate::pins::{Level, PhysicalId};
use crate::registry::{PinDescriptor, PinRegistry};

/// Separates predicate from action.
pub const SEPARATOR: char = ':';
/// Suffix that turns a predicate into a group wildcard.
pub const WILDCARD_SUFFIX: &str = "/*";

/// Case-sensitive action words that drive a line HIGH.
pub const SYNONYMS_HIGH: [&str; 2] = ["on", "close"];
/// Case-sensitive action words that drive a line LOW.
pub const SYNONYMS_LOW: [&str; 2] = ["off", "open"];

/// Outcome of parsing and resolving a command message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// At least one line to drive.
    Targets { pins: Vec<PhysicalId>, level: Level },
    /// The action was understood but nothing matched the predicate.
    ResolutionEmpty { level: Level },
    /// No separator, or the action token is not in the vocabulary.
    ParseFailure,
}

impl Resolution {
    /// Lines to drive (empty unless [`Resolution::Targets`]).
    pub fn targets(&self) -> &[PhysicalId] {
        match self {
            Self::Targets { pins, .. } => pins,
            _ => &[],
        }
    }

    /// The understood action, if any.
    pub fn action(&self) -> Option<Level> {
        match self {
            Self::Targets { level, .. } | Self::ResolutionEmpty { level } => Some(*level),
            Self::ParseFailure => None,
        }
    }
}

/// Map an action token to a level.
pub fn level_for_action(action: &str) -> Option<Level> {
    match action {
        "1" => Some(Level::High),
        "0" => Some(Level::Low),
        a if SYNONYMS_HIGH.contains(&a) => Some(Level::High),
        a if SYNONYMS_LOW.contains(&a) => Some(Level::Low),
        _ => None,
    }
}

/// Parse `message` and resolve its predicate against `registry`.
///
/// Expander lines are never targeted, whichever predicate form matched
/// them.
pub fn parse(message: &str, registry: &PinRegistry) -> Resolution {
    let Some((predicate, action)) = message.rsplit_once(SEPARATOR) else {
        return Resolution::ParseFailure;
    };
    let Some(level) = level_for_action(action) else {
        return Resolution::ParseFailure;
    };

    let candidates: Vec<&PinDescriptor> = match predicate.strip_suffix(WILDCARD_SUFFIX) {
        Some(group) => registry.lookup_group(group),
        None => registry.lookup_variable(predicate).into_iter().collect(),
    };

    let pins: Vec<PhysicalId> = candidates
        .into_iter()
        .filter(|pin| {
            if pin.id().is_expander() {
                info!("Pin ignored for '{}' command: {}", message, pin.id());
                false
            } else {
                true
            }
        })
        .map(PinDescriptor::id)
        .collect();

    if pins.is_empty() {
        Resolution::ResolutionEmpty { level }
    } else {
        Resolution::Targets { pins, level }
    }
}
