#![no_main]

use libfuzzer_sys::fuzz_target;
use prorata::calendar::MonthLabel;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(label) = input.parse::<MonthLabel>() {
            assert_eq!(label.to_string().parse::<MonthLabel>().ok(), Some(label));
        }
    }
});
