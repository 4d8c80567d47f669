/// Resolution of the Go module path used to shorten package identifiers.
///
/// Strategy:
///   1. An explicit root passed on the command line wins (handled by caller)
///   2. Otherwise the `module` directive of a `go.mod` file
///   3. Without either, identifiers are shown in full
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*module\s+(\S+)").unwrap());

/// Extract the module path from the contents of a `go.mod` file.
#[must_use]
pub fn module_root(go_mod: &str) -> Option<String> {
    let caps = MODULE_RE.captures(go_mod)?;
    let path = caps[1].trim_matches('"');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Read the module path from `go.mod` at `path`, or `None` when the file is
/// missing, unreadable, or has no `module` directive.
#[must_use]
pub fn read_module_root(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let root = module_root(&content);
            if root.is_none() {
                tracing::warn!(path = %path.display(), "no module directive found");
            }
            root
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "go.mod not readable");
            None
        }
    }
}
