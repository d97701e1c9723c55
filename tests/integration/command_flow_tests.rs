//! Integration tests for the command pipeline: message → grammar →
//! executor → lines, acknowledgement and data changes.

use crate::mock_hw::{FixedClock, MemoryCache, MockOutputs, RecordingSink};

use relayprop::app::commands::AppCommand;
use relayprop::app::service::PropService;
use relayprop::config::{Board, PropConfig};
use relayprop::pins::{Bank, Level, PhysicalId};

const SETTINGS: &[u8] = br#"[
    {"pin": "GPIO17",     "variable": "lamp",        "initial": 0, "alias": ["on", "off"]},
    {"pin": "MCP23017A0", "variable": "door/strike", "initial": 0, "alias": ["close", "open"]},
    {"pin": "GPIO22",     "variable": "door/buzzer", "initial": 0, "alias": ["buzz", "quiet"]},
    {"pin": "GPIO23",     "variable": "doorbell",    "initial": 0, "alias": ["1", "0"]}
]"#;

fn make_app() -> (PropService, MockOutputs, MemoryCache, FixedClock, RecordingSink) {
    let config = PropConfig {
        board: Board::PiMcp23017,
        ..PropConfig::default()
    };
    let mut app = PropService::new(&config);
    let mut hw = MockOutputs::new();
    let mut cache = MemoryCache::new();
    let clock = FixedClock::at(1_000);
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    app.handle_command(
        AppCommand::RemoteConfiguration(SETTINGS.to_vec()),
        &mut hw,
        &mut cache,
        &clock,
        &mut sink,
    );
    hw.calls.clear();
    sink.clear();
    (app, hw, cache, clock, sink)
}

fn send(
    app: &mut PropService,
    hw: &mut MockOutputs,
    cache: &mut MemoryCache,
    clock: &FixedClock,
    sink: &mut RecordingSink,
    text: &str,
) {
    app.handle_command(AppCommand::Command(text.to_owned()), hw, cache, clock, sink);
}

#[test]
fn exact_command_drives_line_and_acknowledges() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "lamp:on");

    assert_eq!(sink.outbox(), vec!["DONE lamp:on", "DATA lamp=on"]);
    assert_eq!(hw.writes(), vec![(PhysicalId::Gpio(17), Level::High)]);
    assert_eq!(app.registry().lookup_variable("lamp").unwrap().observed(), Level::High);
}

#[test]
fn unknown_action_is_omitted() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "lamp:blorp");

    assert_eq!(sink.outbox(), vec!["OMIT lamp:blorp"]);
    assert!(hw.writes().is_empty());
}

#[test]
fn unknown_variable_is_omitted() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "ghost:on");

    assert_eq!(sink.acks(), vec!["OMIT ghost:on"]);
    assert!(hw.writes().is_empty());
}

#[test]
fn wildcard_skips_expander_line() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "door/*:1");

    assert_eq!(sink.acks(), vec!["DONE door/*:1"]);
    assert_eq!(hw.writes(), vec![(PhysicalId::Gpio(22), Level::High)]);
    let strike = PhysicalId::Expander { bank: Bank::A, bit: 0 };
    assert_eq!(app.registry().descriptor_for(strike).unwrap().observed(), Level::Low);
    // `doorbell` is not in the `door/` group.
    assert_eq!(app.registry().lookup_variable("doorbell").unwrap().observed(), Level::Low);
}

#[test]
fn exact_expander_command_is_omitted() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "door/strike:close");

    assert_eq!(sink.acks(), vec!["OMIT door/strike:close"]);
    assert!(hw.writes().is_empty());
}

#[test]
fn data_changes_use_alias_labels() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "door/buzzer:1");
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "door/buzzer:on");
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "door/buzzer:off");

    assert_eq!(
        sink.outbox(),
        vec![
            "DONE door/buzzer:1",
            "DATA door/buzzer=buzz",
            "DONE door/buzzer:on",
            "DONE door/buzzer:off",
            "DATA door/buzzer=quiet",
        ]
    );
}

#[test]
fn failed_write_still_acknowledges_done() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    hw.broken.insert(PhysicalId::Gpio(17));
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "lamp:on");

    assert_eq!(sink.outbox(), vec!["DONE lamp:on"]);
    assert_eq!(app.registry().lookup_variable("lamp").unwrap().observed(), Level::Low);
}

#[test]
fn builtin_data_commands_publish_everything() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "app:startup");

    assert_eq!(
        sink.outbox(),
        vec![
            "DATA board=Pi MCP23017 settings=OK settings-date=1000 lamp=off \
             door/strike=open door/buzzer=quiet doorbell=0",
            "DONE app:startup",
        ]
    );
    assert!(hw.calls.is_empty());
}

#[test]
fn commands_before_any_settings_are_omitted() {
    let mut app = PropService::new(&PropConfig::default());
    let mut hw = MockOutputs::new();
    let mut cache = MemoryCache::new();
    let clock = FixedClock::at(0);
    let mut sink = RecordingSink::new();

    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "lamp:on");
    assert_eq!(sink.acks(), vec!["OMIT lamp:on"]);
}

#[test]
fn periodic_publication_sends_all_data() {
    let (mut app, mut hw, mut cache, clock, mut sink) = make_app();
    for _ in 0..301 {
        app.tick(0.1, &mut hw, &mut cache, &clock, &mut sink);
    }
    let lines = sink.data_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("DATA board=Pi MCP23017 settings=OK"));
}

#[test]
fn duplicate_variable_data_follows_the_commanded_line() {
    let mut app = PropService::new(&PropConfig::default());
    let mut hw = MockOutputs::new();
    let mut cache = MemoryCache::new();
    let clock = FixedClock::at(100);
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    app.handle_command(
        AppCommand::RemoteConfiguration(
            br#"[
                {"pin": "GPIO22", "variable": "twin", "initial": 0, "alias": ["on", "off"]},
                {"pin": "GPIO5",  "variable": "twin", "initial": 0, "alias": ["up", "down"]}
            ]"#
            .to_vec(),
        ),
        &mut hw,
        &mut cache,
        &clock,
        &mut sink,
    );
    sink.clear();

    send(&mut app, &mut hw, &mut cache, &clock, &mut sink, "twin:on");

    assert_eq!(sink.outbox(), vec!["DONE twin:on", "DATA twin=on"]);
    assert_eq!(hw.level(PhysicalId::Gpio(22)), Some(Level::High));
    assert_eq!(hw.level(PhysicalId::Gpio(5)), Some(Level::Low));
    assert_eq!(app.data_frame().get("twin"), Some("on"));
}

#[test]
fn pin_cannot_shadow_status_items() {
    let mut app = PropService::new(&PropConfig::default());
    let mut hw = MockOutputs::new();
    let mut cache = MemoryCache::new();
    let clock = FixedClock::at(100);
    let mut sink = RecordingSink::new();
    app.handle_command(
        AppCommand::RemoteConfiguration(
            br#"[
                {"pin": "GPIO17", "variable": "lamp",     "initial": 0, "alias": ["on", "off"]},
                {"pin": "GPIO22", "variable": "settings", "initial": 0, "alias": ["on", "off"]}
            ]"#
            .to_vec(),
        ),
        &mut hw,
        &mut cache,
        &clock,
        &mut sink,
    );

    assert_eq!(app.registry().len(), 1);
    assert_eq!(
        app.data_frame().to_string(),
        "DATA board=Pi settings=ONLINE ERROR settings-date=100 lamp=off"
    );
}
