use std::path::Path;

use anyhow::{Context, Result};

use crate::model::Profile;
use crate::parsers::gocover;

/// Read a coverage profile from disk and parse it.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read coverage profile {}", path.display()))?;
    let profile = gocover::parse(&content)
        .with_context(|| format!("Invalid coverage profile {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        packages = profile.packages.len(),
        "loaded coverage profile"
    );
    Ok(profile)
}

/// Read a list of package identifiers, one per line (e.g. `go list ./...`).
///
/// Blank lines and surrounding whitespace are ignored.
pub fn load_known_packages(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read package list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
