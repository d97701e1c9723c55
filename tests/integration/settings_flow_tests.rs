//! Integration tests for settings reconciliation through `PropService`.
//!
//! Remote documents, the startup rescue from the cache, and the status
//! and data every observer sees along the way.

use crate::mock_hw::{FixedClock, LineCall, MemoryCache, MockOutputs, RecordingSink};

use relayprop::app::commands::AppCommand;
use relayprop::app::service::PropService;
use relayprop::config::{Board, PropConfig};
use relayprop::fsm::SettingsStatus;
use relayprop::pins::{Level, PhysicalId};

const VALID: &[u8] = br#"[
    {"pin": "GPIO17", "variable": "lamp",        "initial": 0, "alias": ["on", "off"]},
    {"pin": "GPIO22", "variable": "door/strike", "initial": 1, "alias": ["close", "open"]},
    {"pin": "GPIO23", "variable": "door/buzzer", "initial": 0, "alias": ["1", "0"]}
]"#;

const ONE_MALFORMED: &[u8] = br#"[
    {"pin": "GPIO17", "variable": "lamp",        "initial": 0, "alias": ["on", "off"]},
    {"pin": "GPIO22", "variable": "door/strike", "initial": 1, "alias": ["close", "open"]},
    {"pin": "GPIOxx", "variable": "ghost",       "initial": 0, "alias": ["on", "off"]},
    {"pin": "GPIO23", "variable": "door/buzzer", "initial": 0, "alias": ["1", "0"]}
]"#;

struct Rig {
    app: PropService,
    hw: MockOutputs,
    cache: MemoryCache,
    clock: FixedClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(cache: MemoryCache) -> Self {
        Self::with_config(&PropConfig::default(), cache)
    }

    fn with_config(config: &PropConfig, cache: MemoryCache) -> Self {
        let mut app = PropService::new(config);
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        sink.clear();
        Self {
            app,
            hw: MockOutputs::new(),
            cache,
            clock: FixedClock::at(1_700_000_000),
            sink,
        }
    }

    fn send(&mut self, cmd: AppCommand) {
        self.app
            .handle_command(cmd, &mut self.hw, &mut self.cache, &self.clock, &mut self.sink);
    }

    fn remote(&mut self, bytes: &[u8]) {
        self.send(AppCommand::RemoteConfiguration(bytes.to_vec()));
    }

    fn wait(&mut self, secs: f32) {
        // 100 ms steps, like the host loop.
        let steps = (secs * 10.0).round() as usize;
        for _ in 0..steps {
            self.app
                .tick(0.1, &mut self.hw, &mut self.cache, &self.clock, &mut self.sink);
        }
    }
}

// ── Remote documents ──────────────────────────────────────────

#[test]
fn valid_remote_document_is_ok_and_cached_verbatim() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.remote(VALID);

    let s = rig.app.settings();
    assert_eq!(s.status, SettingsStatus::Ok);
    assert_eq!(s.last_applied_at, Some(1_700_000_000));
    assert_eq!(rig.app.registry().len(), 3);
    assert_eq!(rig.cache.data.as_deref(), Some(VALID));
    assert_eq!(rig.hw.level(PhysicalId::Gpio(22)), Some(Level::High));
}

#[test]
fn partially_malformed_remote_document_is_online_error() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.remote(ONE_MALFORMED);

    assert_eq!(rig.app.settings().status, SettingsStatus::OnlineError);
    assert_eq!(rig.app.registry().len(), 3);
    assert!(rig.app.registry().lookup_variable("ghost").is_none());
    assert_eq!(rig.cache.data.as_deref(), Some(ONE_MALFORMED));
}

#[test]
fn status_is_none_before_any_new_outcome() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.remote(VALID);
    rig.sink.clear();

    rig.remote(ONE_MALFORMED);
    assert_eq!(
        rig.sink.statuses(),
        vec![SettingsStatus::None, SettingsStatus::OnlineError]
    );
    // The reset is published before the outcome.
    assert_eq!(
        rig.sink.data_lines().first().map(String::as_str),
        Some("DATA settings=NONE settings-date=- - -")
    );
}

#[test]
fn reload_releases_old_lines_before_configuring_new_ones() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.remote(VALID);
    rig.hw.calls.clear();

    rig.remote(br#"[{"pin": "GPIO5", "variable": "fan", "initial": 0, "alias": ["on", "off"]}]"#);

    let first_configure = rig
        .hw
        .calls
        .iter()
        .position(|c| matches!(c, LineCall::Configure(..)))
        .unwrap();
    assert_eq!(rig.hw.releases(), 3);
    assert!(rig.hw.calls[..first_configure]
        .iter()
        .all(|c| matches!(c, LineCall::Release(_))));
    assert_eq!(rig.hw.output_count(), 1);
    assert!(rig.app.registry().lookup_variable("lamp").is_none());
}

#[test]
fn undecodable_remote_document_leaves_nothing_applied() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.remote(VALID);
    rig.remote(b"[{\"pin\": \"GPIO4\", ");

    let s = rig.app.settings();
    assert_eq!(s.status, SettingsStatus::None);
    assert_eq!(s.last_applied_at, None);
    assert!(rig.app.registry().is_empty());
    assert_eq!(rig.hw.output_count(), 0);
    // Cache still holds the last good document.
    assert_eq!(rig.cache.data.as_deref(), Some(VALID));
}

#[test]
fn cache_write_failure_still_applies_remote_document() {
    let mut cache = MemoryCache::new();
    cache.fail_writes = true;
    let mut rig = Rig::new(cache);
    rig.remote(VALID);

    assert_eq!(rig.app.settings().status, SettingsStatus::Ok);
    assert_eq!(rig.app.registry().len(), 3);
}

// ── Startup rescue ────────────────────────────────────────────

#[test]
fn rescue_applies_cached_document_after_delay() {
    let mut rig = Rig::new(MemoryCache::holding(VALID, 1_600_000_000));

    rig.wait(2.5);
    assert_eq!(rig.app.settings().status, SettingsStatus::None);

    rig.wait(1.0);
    let s = rig.app.settings();
    assert_eq!(s.status, SettingsStatus::Offline);
    assert_eq!(s.last_applied_at, Some(1_600_000_000));
    assert_eq!(rig.app.registry().len(), 3);
    assert_eq!(
        rig.sink.data_lines().last().map(String::as_str),
        Some("DATA board=Pi settings=OFFLINE settings-date=1600000000 lamp=off door/strike=close door/buzzer=0")
    );
}

#[test]
fn rescue_with_malformed_record_is_offline_error() {
    let mut rig = Rig::new(MemoryCache::holding(ONE_MALFORMED, 5));
    rig.wait(3.5);

    assert_eq!(rig.app.settings().status, SettingsStatus::OfflineError);
    assert_eq!(rig.app.registry().len(), 3);
}

#[test]
fn rescue_does_nothing_once_remote_document_applied() {
    let mut rig = Rig::new(MemoryCache::holding(ONE_MALFORMED, 5));
    rig.remote(VALID);
    rig.sink.clear();
    rig.hw.calls.clear();

    rig.wait(3.5);

    assert_eq!(rig.app.settings().status, SettingsStatus::Ok);
    assert_eq!(rig.app.settings().last_applied_at, Some(1_700_000_000));
    assert!(rig.sink.statuses().is_empty());
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn rescue_without_cache_stays_none() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.wait(3.5);
    assert_eq!(rig.app.settings().status, SettingsStatus::None);

    let mut cache = MemoryCache::holding(VALID, 5);
    cache.fail_reads = true;
    let mut rig = Rig::new(cache);
    rig.wait(3.5);
    assert_eq!(rig.app.settings().status, SettingsStatus::None);
    assert!(rig.app.registry().is_empty());
}

#[test]
fn remote_document_after_rescue_takes_over() {
    let mut rig = Rig::new(MemoryCache::holding(VALID, 5));
    rig.wait(3.5);
    assert_eq!(rig.app.settings().status, SettingsStatus::Offline);

    rig.clock.advance(60);
    rig.remote(ONE_MALFORMED);
    let s = rig.app.settings();
    assert_eq!(s.status, SettingsStatus::OnlineError);
    assert_eq!(s.last_applied_at, Some(1_700_000_060));
}

#[test]
fn rescue_delay_follows_config() {
    let cfg = PropConfig {
        rescue_delay_secs: 10,
        ..PropConfig::default()
    };
    let mut rig = Rig::with_config(&cfg, MemoryCache::holding(VALID, 5));
    rig.wait(9.5);
    assert_eq!(rig.app.settings().status, SettingsStatus::None);
    rig.wait(1.0);
    assert_eq!(rig.app.settings().status, SettingsStatus::Offline);
}

// ── Board policy ──────────────────────────────────────────────

#[test]
fn expander_board_hosts_expander_lines_but_not_i2c_bus() {
    let cfg = PropConfig {
        board: Board::PiMcp23017,
        ..PropConfig::default()
    };
    let mut rig = Rig::with_config(&cfg, MemoryCache::new());
    rig.remote(br#"[
        {"pin": "MCP23017A0", "variable": "door/strike", "initial": 0, "alias": ["close", "open"]},
        {"pin": "GPIO2",      "variable": "sda",         "initial": 0, "alias": ["1", "0"]},
        {"pin": "GPIO17",     "variable": "door/buzzer", "initial": 0, "alias": ["1", "0"]}
    ]"#);

    // Ignored records are not failures.
    assert_eq!(rig.app.settings().status, SettingsStatus::Ok);
    assert_eq!(rig.app.registry().len(), 2);
    assert!(rig.app.registry().lookup_variable("sda").is_none());
}

#[test]
fn bare_board_ignores_expander_lines() {
    let mut rig = Rig::new(MemoryCache::new());
    rig.remote(br#"[
        {"pin": "MCP23017B7", "variable": "x", "initial": 0, "alias": ["1", "0"]},
        {"pin": "GPIO2",      "variable": "y", "initial": 0, "alias": ["1", "0"]}
    ]"#);

    assert_eq!(rig.app.settings().status, SettingsStatus::Ok);
    assert_eq!(rig.app.registry().len(), 1);
    assert!(rig.app.registry().lookup_variable("y").is_some());
}
