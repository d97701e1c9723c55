//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger.  Used when no bus transport is attached, and alongside the
//! outbox publisher for a local trace.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { board } => {
                info!("START | board={}", board);
            }
            AppEvent::SettingsChanged(s) => {
                info!("SETTINGS | {} | date={}", s.status, s.settings_date());
            }
            AppEvent::Acknowledged(ack) => {
                info!("ACK | {}", ack);
            }
            AppEvent::Data(frame) => {
                info!("DATA | {} items | {}", frame.len(), frame);
            }
        }
    }
}

/// Fans one event out to two sinks, in order.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
