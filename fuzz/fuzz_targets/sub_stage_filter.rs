#![no_main]

use libfuzzer_sys::fuzz_target;
use stagecraft::{Filter, Inclusion, SubStageFilter};

const DECLARED: [&str; 4] = ["compile", "replace", "test", "document"];

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (only, without) = text.split_once('|').unwrap_or((text, ""));
    let only = Filter::parse([only]);
    let without = Filter::parse([without]);
    let filter = SubStageFilter::new(&only, &without);

    for name in DECLARED {
        let decision = filter.decide(&DECLARED, name, true);
        if without.contains(name) {
            assert_eq!(decision, Inclusion::Excluded);
        }
        if decision.is_included() {
            assert!(only.is_empty() || only.contains(name));
        }
    }
    assert_eq!(filter.decide(&DECLARED, "missing", true), Inclusion::Undeclared);
});
