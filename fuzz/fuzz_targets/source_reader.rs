#![no_main]

use libfuzzer_sys::fuzz_target;
use logmerge::readers::SourceLineReader;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // first byte picks the fallback encoding
    let encoding = match data[0] % 3 {
        0 => encoding_rs::WINDOWS_1251,
        1 => encoding_rs::UTF_8,
        _ => encoding_rs::IBM866,
    };

    let mut reader = SourceLineReader::new(&data[1..], encoding);
    let mut line = String::new();
    while let Ok(true) = reader.read_line(&mut line) {
        assert!(!line.contains(['\r', '\n']));
    }
});
