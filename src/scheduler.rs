//! Timer/scheduler engine.
//!
//! Drives the two timed behaviours of the prop: the one-shot settings
//! rescue shortly after startup, and the periodic full `DATA`
//! publication.  The scheduler notifies a [`SchedulerDelegate`] when
//! entries fire; it never touches the registry or the bus itself.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Timed Sources                         │
//! │                                                          │
//! │     ┌──────────────────┐        ┌──────────────────┐     │
//! │     │ One-Shot         │        │ Periodic         │     │
//! │     │ settings rescue  │        │ publish all data │     │
//! │     └────────┬─────────┘        └────────┬─────────┘     │
//! │              │                           │               │
//! │              ▼                           ▼               │
//! │     ┌────────────────────────────────────────────────┐   │
//! │     │              SchedulerDelegate                 │   │
//! │     └──────────────────────┬─────────────────────────┘   │
//! │                            │                             │
//! │                            ▼                             │
//! │                PropService.handle_command()              │
//! └──────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Label handed to the delegate when the entry fires.
    pub label: &'static str,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

/// The type of schedule determines how and when it fires.
#[derive(Debug, Clone)]
pub enum ScheduleKind {
    /// Fire every `interval_secs` seconds.
    Periodic { interval_secs: u32 },
    /// Fire once after `delay_secs`, then auto-disable.
    OneShot { delay_secs: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Decoupled from the event system: fired entries go to the
/// [`SchedulerDelegate`] callback, so the engine can be ticked from a
/// test with a recording delegate.
pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Seconds since the entry was added or last fired.
    elapsed_secs: f32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    elapsed_secs: 0.0,
                });
                return Some(i);
            }
        }
        None
    }

    /// Advance every enabled entry by `elapsed_secs`.
    ///
    /// Entries fire in slot order.  A periodic entry fires at most once per
    /// call even if the step spans several intervals.
    pub fn tick(&mut self, elapsed_secs: f32, delegate: &mut dyn SchedulerDelegate) {
        for slot in self.schedules.iter_mut() {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            entry.elapsed_secs += elapsed_secs;

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_secs } => {
                    if entry.elapsed_secs >= interval_secs as f32 {
                        info!(
                            "Scheduler: '{}' periodic fire (every {}s)",
                            entry.schedule.label, interval_secs
                        );
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::Periodic);
                        entry.elapsed_secs = 0.0;
                    }
                }

                ScheduleKind::OneShot { delay_secs } => {
                    if entry.elapsed_secs >= delay_secs as f32 {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {}s)",
                            entry.schedule.label, delay_secs
                        );
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::OneShot);
                        entry.schedule.enabled = false; // Auto-disable.
                    }
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
