#![no_main]

use gameshelf::config::parse_registry_json;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary registry files must be rejected with an error, never a panic
    if let Ok(s) = std::str::from_utf8(data) {
        let _result = parse_registry_json(s);
    }
});
