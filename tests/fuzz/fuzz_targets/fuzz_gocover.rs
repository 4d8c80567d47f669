#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parser must not panic on any input, and accepted profiles must add up.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(profile) = coverdiff::parsers::gocover::parse(s) {
            let total: u64 = profile.packages.values().map(|p| p.total_statements).sum();
            assert_eq!(total, profile.total_statements);
        }
    }
});
