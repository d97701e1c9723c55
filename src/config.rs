//! Prop configuration parameters
//!
//! Everything the engine needs that is not part of the wiring document:
//! board kind, timer periods, cache location and bus topics.
//! Values can be overridden by a JSON file given on the command line.

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Board variant the prop runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Board {
    /// Bare Raspberry Pi header.
    #[serde(rename = "Pi")]
    Pi,
    /// Raspberry Pi with an MCP23017 expander on I²C.
    #[serde(rename = "Pi MCP23017")]
    PiMcp23017,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pi => write!(f, "Pi"),
            Self::PiMcp23017 => write!(f, "Pi MCP23017"),
        }
    }
}

/// Core prop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropConfig {
    // --- Hardware ---
    pub board: Board,

    // --- Timing ---
    /// Delay before falling back to the cached settings (seconds)
    pub rescue_delay_secs: u32,
    /// Period of the full `DATA` publication (seconds)
    pub publish_all_data_secs: u32,
    /// Main loop tick (milliseconds)
    pub tick_interval_ms: u32,

    // --- Storage ---
    /// Local copy of the last remote settings document
    pub settings_cache_path: String,

    // --- Bus ---
    pub inbox_topic: String,
    pub outbox_topic: String,
    pub settings_topic: String,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            board: Board::Pi,

            rescue_delay_secs: 3,
            publish_all_data_secs: 30,
            tick_interval_ms: 100, // 10 Hz

            settings_cache_path: "./settings.json".to_owned(),

            inbox_topic: "Room/Prop/inbox".to_owned(),
            outbox_topic: "Room/Prop/outbox".to_owned(),
            settings_topic: "Room/Prop/settings".to_owned(),
        }
    }
}

/// Errors from loading or validating a [`PropConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The file is not valid JSON for this structure.
    Corrupted(String),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl PropConfig {
    /// Parse and validate a JSON config.  Missing fields take defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=60).contains(&self.rescue_delay_secs) {
            return Err(ConfigError::ValidationFailed("rescue_delay_secs must be 1–60"));
        }
        if !(1..=3600).contains(&self.publish_all_data_secs) {
            return Err(ConfigError::ValidationFailed(
                "publish_all_data_secs must be 1–3600",
            ));
        }
        if !(10..=1000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be 10–1000"));
        }
        if self.settings_cache_path.is_empty() {
            return Err(ConfigError::ValidationFailed("settings_cache_path must be set"));
        }
        for topic in [&self.inbox_topic, &self.outbox_topic, &self.settings_topic] {
            if topic.is_empty() || topic.contains(char::is_whitespace) {
                return Err(ConfigError::ValidationFailed(
                    "topics must be non-empty and contain no whitespace",
                ));
            }
        }
        if self.inbox_topic == self.settings_topic {
            return Err(ConfigError::ValidationFailed(
                "inbox_topic and settings_topic must differ",
            ));
        }
        Ok(())
    }

    /// How long the runtime keeps ticking after end of input: the rescue
    /// delay plus one tick, so the one-shot rescue has fired by then.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(u64::from(self.rescue_delay_secs))
            + Duration::from_millis(u64::from(self.tick_interval_ms))
    }
}
