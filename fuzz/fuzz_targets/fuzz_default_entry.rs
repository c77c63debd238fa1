#![no_main]

use gameshelf::import::derive_default_entry;
use libfuzzer_sys::fuzz_target;
use std::path::Path;
use uuid::Uuid;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(entry) = derive_default_entry(Path::new(s), Uuid::from_u128(1)) {
            assert!(!entry.display_name.trim().is_empty());
            assert_eq!(entry.executable_path, Path::new(s));
        }
    }
});
