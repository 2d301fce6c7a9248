#![no_main]

use libfuzzer_sys::fuzz_target;
use logmerge::config_file::ConfigFile;

fuzz_target!(|data: &[u8]| {
    let (content, _, _) = encoding_rs::UTF_8.decode(data);
    let config = ConfigFile::parse_ini_content(&content);

    for pattern in &config.excludes {
        assert!(!pattern.is_empty());
        assert_eq!(pattern.trim(), pattern);
    }
    for label in config.sources.keys() {
        assert!(!label.is_empty());
    }
});
