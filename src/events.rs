//! Inbound event queue.
//!
//! Events are produced by:
//! - the transport reader (settings documents, command messages)
//! - the host runtime (shutdown on end of input)
//!
//! Events are consumed by the main loop, which is the single writer of
//! the registry and the settings state.  Timer-driven work (the settings
//! rescue and periodic publication) runs on the same loop between
//! receives, so nothing ever touches the engine concurrently.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Transport   │────▶│              │     │              │
//! │ reader      │     │  Event Queue │────▶│  Main Loop   │
//! │ Runtime     │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use crate::app::commands::AppCommand;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Inbound event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Raw document received on the settings topic.
    RemoteConfigurationReceived(Vec<u8>),
    /// Text received on the inbox topic.
    CommandReceived(String),
    /// The input side is gone; stop the loop.
    Shutdown,
}

impl Event {
    /// The service command for this event, `None` for [`Event::Shutdown`].
    pub fn into_command(self) -> Option<AppCommand> {
        match self {
            Self::RemoteConfigurationReceived(bytes) => Some(AppCommand::RemoteConfiguration(bytes)),
            Self::CommandReceived(text) => Some(AppCommand::Command(text)),
            Self::Shutdown => None,
        }
    }
}

/// Producer half.  Cloneable, one per input thread.
#[derive(Debug, Clone)]
pub struct EventProducer {
    tx: SyncSender<Event>,
}

impl EventProducer {
    /// Push, waiting for room.  Returns `false` if the consumer is gone.
    pub fn push_event_blocking(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half, owned by the main loop.
#[derive(Debug)]
pub struct EventQueue {
    rx: Receiver<Event>,
    tx: SyncSender<Event>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE_CAP);
        Self { rx, tx }
    }

    pub fn producer(&self) -> EventProducer {
        EventProducer {
            tx: self.tx.clone(),
        }
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Never reports disconnection: the queue keeps a sender of its own.
    pub fn wait_event(&self, timeout: Duration) -> Option<Event> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
