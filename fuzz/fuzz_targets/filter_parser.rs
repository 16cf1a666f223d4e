#![no_main]

use libfuzzer_sys::fuzz_target;
use prorata::filter::ContractFilter;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Bad expressions must come back as errors, never panics
        let _ = ContractFilter::from_exprs(input.split(';'));
    }
});
