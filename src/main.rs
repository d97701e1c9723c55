//! Relay prop host runtime — main entry point.
//!
//! Hexagonal architecture with a single-writer event loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedGpio   FileCacheStore   SystemClock   OutboxSink     │
//! │  (OutputPort)    (CacheStore)     (ClockPort)   (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              PropService (pure logic)                  │    │
//! │  │  Settings FSM · Registry · Grammar · Scheduler         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  stdin reader thread ──▶ EventQueue ──▶ main loop              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use env_logger::Env;
use log::{info, warn};

use relayprop::adapters::cache_file::FileCacheStore;
use relayprop::adapters::console::{self, OutboxSink, WriteTransport};
use relayprop::adapters::gpio::SimulatedGpio;
use relayprop::adapters::log_sink::{LogEventSink, Tee};
use relayprop::adapters::time::SystemClock;
use relayprop::app::service::PropService;
use relayprop::config::PropConfig;
use relayprop::events::{Event, EventProducer, EventQueue};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Relay prop v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => {
            warn!("No config file given, running with defaults");
            PropConfig::default()
        }
    };
    info!(
        "Board '{}', settings on '{}', commands on '{}'",
        config.board, config.settings_topic, config.inbox_topic
    );

    // ── 3. Adapters ───────────────────────────────────────────
    let mut hw = SimulatedGpio::new();
    let mut cache = FileCacheStore::new(&config.settings_cache_path);
    let clock = SystemClock::new();
    let mut sink = Tee(
        LogEventSink::new(),
        OutboxSink::new(WriteTransport::stdout(), config.outbox_topic.clone()),
    );

    // ── 4. Inbound queue + reader ─────────────────────────────
    let queue = EventQueue::new();
    spawn_stdin_reader(queue.producer(), config.clone())?;

    // ── 5. Service ────────────────────────────────────────────
    let mut app = PropService::new(&config);
    app.start(&mut sink);

    // ── 6. Event loop ─────────────────────────────────────────
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    let started = Instant::now();
    let mut last_tick = started;
    // After end of input, keep ticking until the settings rescue has run.
    let grace = config.shutdown_grace();
    let mut input_closed = false;

    loop {
        match queue.wait_event(tick) {
            Some(Event::Shutdown) => {
                info!("Input closed after {}s", clock.uptime_secs());
                input_closed = true;
            }
            Some(event) => {
                if let Some(cmd) = event.into_command() {
                    app.handle_command(cmd, &mut hw, &mut cache, &clock, &mut sink);
                }
            }
            None => {}
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick);
        if elapsed >= tick {
            app.tick(elapsed.as_secs_f32(), &mut hw, &mut cache, &clock, &mut sink);
            last_tick = now;
        }

        if input_closed && now.duration_since(started) >= grace {
            break;
        }
    }

    info!("Shutting down after {}s", clock.uptime_secs());
    Ok(())
}

fn load_config(path: &Path) -> Result<PropConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config = PropConfig::from_json(&bytes)
        .with_context(|| format!("loading config file {}", path.display()))?;
    info!("Config loaded from {}", path.display());
    Ok(config)
}

/// Feed stdin lines into the queue until end of input.
fn spawn_stdin_reader(producer: EventProducer, config: PropConfig) -> Result<()> {
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("stdin read failed: {}", e);
                        break;
                    }
                };
                if let Some(event) = console::parse_line(&line, &config) {
                    if !producer.push_event_blocking(event) {
                        return;
                    }
                }
            }
            producer.push_event_blocking(Event::Shutdown);
        })
        .context("spawning stdin reader")?;
    Ok(())
}
