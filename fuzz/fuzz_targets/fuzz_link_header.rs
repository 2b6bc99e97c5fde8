#![no_main]

use deployaudit_core::http::transport::parse_link_next;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let header = String::from_utf8_lossy(data);

    // Should never panic
    if let Some(next) = parse_link_next(&header) {
        assert!(!next.is_empty());
        assert!(header.contains(next.as_str()));
    }
});
