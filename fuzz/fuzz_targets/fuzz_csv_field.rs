#![no_main]

use deployaudit_core::output::csv_format::escape_csv_into;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(field) = std::str::from_utf8(data) {
        let mut buf = String::new();
        escape_csv_into(field, &mut buf);

        if buf.starts_with('"') && buf != field {
            // Quoted: outer quotes plus every inner quote doubled
            let inner = &buf[1..buf.len() - 1];
            assert_eq!(inner.replace("\"\"", "\""), field);
        } else {
            assert_eq!(buf, field);
        }
    }
});
