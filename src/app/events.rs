//! Outbound application events.
//!
//! The [`PropService`](super::service::PropService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, or publish them on the
//! outbox topic.

use core::fmt;
use std::collections::HashMap;

use crate::config::Board;
use crate::executor::Acknowledgement;
use crate::fsm::context::SettingsSnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started.
    Started { board: Board },

    /// The settings machine moved (including the transient reset to `NONE`).
    SettingsChanged(SettingsSnapshot),

    /// A command message was handled.
    Acknowledged(Acknowledgement),

    /// Prop data items to publish.
    Data(DataFrame),
}

/// An ordered set of `name=value` data items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFrame {
    items: Vec<(String, String)>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.  A repeated name keeps the earlier value, matching
    /// the first-inserted-wins lookup of duplicate variables.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.get(&name).is_none() {
            self.items.push((name, value.into()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DATA")?;
        for (name, value) in &self.items {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

/// Remembers the last published value of every item.
#[derive(Debug, Default)]
pub struct DataTracker {
    published: HashMap<String, String>,
}

impl DataTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the whole frame as published and hand it back.  The frame
    /// becomes the new baseline; names it lacks are forgotten.
    pub fn all(&mut self, frame: DataFrame) -> DataFrame {
        self.published = frame
            .items()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();
        frame
    }

    /// Keep only the items whose value differs from the last publication.
    pub fn changes(&mut self, frame: DataFrame) -> DataFrame {
        let mut changed = DataFrame::new();
        for (name, value) in frame.items {
            if self.published.get(&name) != Some(&value) {
                self.published.insert(name.clone(), value.clone());
                changed.items.push((name, value));
            }
        }
        changed
    }
}
