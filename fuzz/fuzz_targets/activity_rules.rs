#![no_main]

use bootline::activity::ActivityRules;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed rule files must be rejected, never panic
        let _ = ActivityRules::from_toml_str(input);
    }
});
