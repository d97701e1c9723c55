//! Fuzz target: settings document decode + apply
//!
//! Arbitrary bytes must either fail to decode with an offset inside the
//! input, or decode into a document whose application never panics and
//! accounts for every record.
//!
//! cargo fuzz run fuzz_settings_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use relayprop::adapters::gpio::SimulatedGpio;
use relayprop::codec;
use relayprop::registry::{ExpanderPolicy, PinRegistry};

fuzz_target!(|data: &[u8]| {
    match codec::decode(data) {
        Err(e) => {
            if let Some(offset) = e.offset {
                assert!(offset <= data.len(), "offset past end of payload");
            }
        }
        Ok(doc) => {
            let mut hw = SimulatedGpio::new();
            let mut registry = PinRegistry::new();
            for policy in [ExpanderPolicy::Absent, ExpanderPolicy::Present] {
                let report = registry.apply(&doc, policy, &mut hw);
                assert_eq!(
                    report.applied + report.ignored + report.failures(),
                    doc.records.len()
                );
                assert!(registry.len() <= report.applied);
            }
            registry.clear(&mut hw);
            assert_eq!(hw.output_count(), 0);
        }
    }
});
