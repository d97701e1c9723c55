//! Fuzz target: command parse + execute
//!
//! Any message must resolve without panicking, never target an expander
//! line, and be acknowledged `DONE` exactly when it resolved to targets.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use relayprop::adapters::gpio::SimulatedGpio;
use relayprop::codec::{ConfigRecord, Document};
use relayprop::executor;
use relayprop::grammar::{self, Resolution};
use relayprop::pins::Level;
use relayprop::registry::{ExpanderPolicy, PinRegistry};

fuzz_target!(|data: &[u8]| {
    let Ok(message) = std::str::from_utf8(data) else {
        return;
    };

    let mut hw = SimulatedGpio::new();
    let mut registry = PinRegistry::new();
    let doc = Document {
        records: vec![
            ConfigRecord::new("GPIO17", "lamp", Level::Low, ("on", "off")),
            ConfigRecord::new("GPIO22", "door/a", Level::Low, ("close", "open")),
            ConfigRecord::new("MCP23017A0", "door/b", Level::Low, ("close", "open")),
        ],
    };
    registry.apply(&doc, ExpanderPolicy::Present, &mut hw);

    let resolution = grammar::parse(message, &registry);
    assert!(resolution.targets().iter().all(|id| !id.is_expander()));

    let ack = executor::execute(message, &resolution, &mut registry, &mut hw);
    assert_eq!(ack.message(), message);
    assert_eq!(ack.is_done(), matches!(resolution, Resolution::Targets { .. }));
});
