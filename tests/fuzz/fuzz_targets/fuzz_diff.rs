#![no_main]
use libfuzzer_sys::fuzz_target;

use coverdiff::diff::ProfileDiff;
use coverdiff::report::{render_table, RenderOptions};

fuzz_target!(|data: (&str, &str)| {
    // Rendering any pair of accepted profiles must not panic.
    let (base, head) = data;
    if let (Ok(base), Ok(head)) = (
        coverdiff::parsers::gocover::parse(base),
        coverdiff::parsers::gocover::parse(head),
    ) {
        let _ = render_table(&ProfileDiff::between(&base, &head), &RenderOptions::default());
    }
});
