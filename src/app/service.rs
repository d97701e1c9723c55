//! Application service — the hexagonal core.
//!
//! [`PropService`] owns the pin registry, the settings machine and the
//! scheduler.  It exposes a hardware-agnostic API; all I/O flows through
//! port traits injected at call sites, so the whole service runs against
//! mock adapters in tests.
//!
//! ```text
//!   settings doc ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!   command msg  ──▶ │       PropService       │     (DONE/OMIT, DATA)
//!   tick         ──▶ │ Settings · Registry ·   │
//!                    │ Grammar · Scheduler     │ ──▶ OutputPort
//!                    └─────────────────────────┘ ◀─▶ CacheStore
//! ```

use log::{debug, info};

use crate::config::{Board, PropConfig};
use crate::executor::{self, Acknowledgement};
use crate::fsm::SettingsMachine;
use crate::fsm::context::SettingsSnapshot;
use crate::grammar;
use crate::registry::{ExpanderPolicy, PinRegistry};
use crate::scheduler::{Schedule, ScheduleKind, Scheduler};

use super::commands::AppCommand;
use super::events::{AppEvent, DataFrame, DataTracker};
use super::ports::{CacheStore, ClockPort, EventSink, OutputPort, ScheduleFiredKind, SchedulerDelegate};

/// Built-in command: publish all data (sent by the control room on connect).
pub const CMD_STARTUP: &str = "app:startup";
/// Built-in command: publish all data.
pub const CMD_DATA: &str = "app:data";

/// Scheduler label of the one-shot settings rescue.
pub const SCHEDULE_RESCUE: &str = "settings-rescue";
/// Scheduler label of the periodic full publication.
pub const SCHEDULE_PUBLISH: &str = "publish-all-data";

// ───────────────────────────────────────────────────────────────
// PropService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct PropService {
    board: Board,
    registry: PinRegistry,
    settings: SettingsMachine,
    scheduler: Scheduler,
    tracker: DataTracker,
}

impl PropService {
    /// Construct the service and arm its timers.
    ///
    /// Does **not** publish anything; call [`start`](Self::start) next.
    pub fn new(config: &PropConfig) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.add(Schedule {
            label: SCHEDULE_RESCUE,
            kind: ScheduleKind::OneShot {
                delay_secs: config.rescue_delay_secs,
            },
            enabled: true,
        });
        scheduler.add(Schedule {
            label: SCHEDULE_PUBLISH,
            kind: ScheduleKind::Periodic {
                interval_secs: config.publish_all_data_secs,
            },
            enabled: true,
        });

        Self {
            board: config.board,
            registry: PinRegistry::new(),
            settings: SettingsMachine::new(ExpanderPolicy::from(config.board)),
            scheduler,
            tracker: DataTracker::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the service and publish the initial data.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started { board: self.board });
        info!("PropService started on '{}'", self.board);
        self.publish_all_data(sink);
    }

    /// Advance the timers by `elapsed_secs` and run whatever fired.
    pub fn tick(
        &mut self,
        elapsed_secs: f32,
        hw: &mut impl OutputPort,
        cache: &mut impl CacheStore,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        let mut fired = FiredCommands::default();
        self.scheduler.tick(elapsed_secs, &mut fired);
        for cmd in fired.0 {
            self.handle_command(cmd, hw, cache, clock, sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one inbound command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl OutputPort,
        cache: &mut impl CacheStore,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::RemoteConfiguration(bytes) => {
                let mut relay = ResetRelay::new(self.board, &mut self.tracker, sink);
                self.settings
                    .on_remote_document(&bytes, &mut self.registry, hw, cache, clock, &mut relay);
                self.publish_all_data(sink);
            }
            AppCommand::StartupRescue => {
                let pending =
                    !self.settings.rescue_done() && self.settings.last_applied_at().is_none();
                let mut relay = ResetRelay::new(self.board, &mut self.tracker, sink);
                self.settings
                    .on_startup_rescue(&mut self.registry, hw, &*cache, clock, &mut relay);
                if pending {
                    self.publish_all_data(sink);
                }
            }
            AppCommand::Command(message) => self.on_message(&message, hw, sink),
            AppCommand::PublishAllData => self.publish_all_data(sink),
        }
    }

    fn on_message(&mut self, message: &str, hw: &mut impl OutputPort, sink: &mut impl EventSink) {
        if message == CMD_STARTUP || message == CMD_DATA {
            self.publish_all_data(sink);
            sink.emit(&AppEvent::Acknowledged(Acknowledgement::Done(message.to_owned())));
            return;
        }

        let resolution = grammar::parse(message, &self.registry);
        let ack = executor::execute(message, &resolution, &mut self.registry, hw);
        sink.emit(&AppEvent::Acknowledged(ack));
        self.publish_data_changes(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    pub fn settings(&self) -> SettingsSnapshot {
        self.settings.snapshot()
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// Every data item with its current value.
    pub fn data_frame(&self) -> DataFrame {
        let mut frame = settings_frame(self.board, &self.settings.snapshot());
        for pin in self.registry.iter() {
            frame.push(pin.variable(), pin.observed_label());
        }
        frame
    }

    // ── Publishing ────────────────────────────────────────────

    fn publish_all_data(&mut self, sink: &mut impl EventSink) {
        let frame = self.data_frame();
        let frame = self.tracker.all(frame);
        sink.emit(&AppEvent::Data(frame));
    }

    fn publish_data_changes(&mut self, sink: &mut impl EventSink) {
        let frame = self.data_frame();
        let frame = self.tracker.changes(frame);
        if !frame.is_empty() {
            sink.emit(&AppEvent::Data(frame));
        }
    }
}

fn settings_frame(board: Board, snapshot: &SettingsSnapshot) -> DataFrame {
    let mut frame = DataFrame::new();
    frame.push("board", board.to_string());
    frame.push("settings", snapshot.status.name());
    frame.push("settings-date", snapshot.settings_date());
    frame
}

// ───────────────────────────────────────────────────────────────
// Sink wrappers
// ───────────────────────────────────────────────────────────────

/// Forwards settings events and publishes the data changes of the reset
/// step as soon as the machine announces it.
struct ResetRelay<'a, S: EventSink> {
    board: Board,
    tracker: &'a mut DataTracker,
    sink: &'a mut S,
}

impl<'a, S: EventSink> ResetRelay<'a, S> {
    fn new(board: Board, tracker: &'a mut DataTracker, sink: &'a mut S) -> Self {
        Self {
            board,
            tracker,
            sink,
        }
    }
}

impl<S: EventSink> EventSink for ResetRelay<'_, S> {
    fn emit(&mut self, event: &AppEvent) {
        self.sink.emit(event);
        if let AppEvent::SettingsChanged(snapshot) = event {
            if !snapshot.status.is_applied() {
                let changes = self.tracker.changes(settings_frame(self.board, snapshot));
                if !changes.is_empty() {
                    self.sink.emit(&AppEvent::Data(changes));
                }
            }
        }
    }
}

/// Collects fired schedules as service commands.
#[derive(Default)]
struct FiredCommands(Vec<AppCommand>);

impl SchedulerDelegate for FiredCommands {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
        debug!("Schedule fired: '{}' ({:?})", label, kind);
        match label {
            SCHEDULE_RESCUE => self.0.push(AppCommand::StartupRescue),
            SCHEDULE_PUBLISH => self.0.push(AppCommand::PublishAllData),
            _ => {}
        }
    }
}
