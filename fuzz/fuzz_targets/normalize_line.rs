#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use logmerge::normalize::{clean_line, normalize_line, passes_gate};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let label: Arc<str> = Arc::from("fuzz");
    match normalize_line(input, &label) {
        Some(record) => {
            assert!(passes_gate(input));
            assert_eq!(record.cleaned_line(), clean_line(input));
            assert_eq!(record.date_part().len(), 8);
            assert!(record.output_line().ends_with(";fuzz"));
            // accessors slice on char boundaries
            let _ = (record.time_part(), record.remainder(), record.sort_key());
        }
        None => assert!(!passes_gate(input)),
    }
});
