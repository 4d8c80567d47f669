use std::path::{Path, PathBuf};

/// Directory holding the checked-in fixtures.
pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Parse a fixture profile by file name.
pub fn fixture_profile(name: &str) -> coverdiff::model::Profile {
    coverdiff::ingest::load_profile(&fixtures().join(name)).unwrap()
}
