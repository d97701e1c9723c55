//! Line-oriented console transport.
//!
//! Stands in for the message bus on a host: every input line is
//! `<topic> <payload>`, every publication is written as `<topic> <text>`.
//!
//! ```text
//!   stdin  ──▶ parse_line ──▶ Event ──▶ queue
//!   AppEvent ──▶ OutboxSink ──▶ Transport ──▶ stdout
//! ```

use std::io::Write;

use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, Transport, TransportError};
use crate::config::PropConfig;
use crate::events::Event;

/// Map one input line to an inbound event.
///
/// Lines for other topics, and lines without a payload, yield `None`.
pub fn parse_line(line: &str, config: &PropConfig) -> Option<Event> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (topic, payload) = line.split_once(' ')?;

    if topic == config.settings_topic {
        Some(Event::RemoteConfigurationReceived(payload.as_bytes().to_vec()))
    } else if topic == config.inbox_topic {
        Some(Event::CommandReceived(payload.to_owned()))
    } else {
        debug!("Console: ignoring topic '{}'", topic);
        None
    }
}

/// [`Transport`] writing `<topic> <text>` lines to any writer.
pub struct WriteTransport<W: Write> {
    out: W,
}

impl<W: Write> WriteTransport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl WriteTransport<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Transport for WriteTransport<W> {
    fn publish(&mut self, topic: &str, text: &str) -> Result<(), TransportError> {
        writeln!(self.out, "{} {}", topic, text)
            .and_then(|()| self.out.flush())
            .map_err(|_| TransportError::IoError)
    }
}

/// Publishes acknowledgements and data on the outbox topic.
pub struct OutboxSink<T: Transport> {
    transport: T,
    topic: String,
}

impl<T: Transport> OutboxSink<T> {
    pub fn new(transport: T, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn publish(&mut self, text: &str) {
        if let Err(e) = self.transport.publish(&self.topic, text) {
            warn!("Outbox: publish '{}' failed: {}", text, e);
        }
    }
}

impl<T: Transport> EventSink for OutboxSink<T> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Acknowledged(ack) => self.publish(&ack.to_string()),
            AppEvent::Data(frame) => self.publish(&frame.to_string()),
            AppEvent::Started { .. } | AppEvent::SettingsChanged(_) => {}
        }
    }
}
