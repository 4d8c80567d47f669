//! Command handler functions for the coverdiff CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::diff::{Change, DiffRow, ProfileDiff};
use crate::github;
use crate::ingest::{load_known_packages, load_profile};
use crate::model::Coverage;
use crate::module::read_module_root;
use crate::report::{
    strip_module_root, CoverageDiffReport, MarkdownFormatter, RenderOptions, TextFormatter,
};

/// Output style for the report printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
    Json,
}

/// Module root from `--module-root` if given, else from the `go.mod` file.
#[must_use]
pub fn resolve_module_root(explicit: Option<&str>, go_mod: &Path) -> Option<String> {
    match explicit {
        Some(root) => Some(root.to_string()),
        None => read_module_root(go_mod),
    }
}

/// Load both profiles (and the optional package list) and compare them.
///
/// Fails before anything is rendered if either profile is malformed.
pub fn build_report(
    base: &Path,
    head: &Path,
    known_packages: Option<&Path>,
    options: RenderOptions,
) -> Result<CoverageDiffReport> {
    let base = load_profile(base)?;
    let head = load_profile(head)?;

    let known = match known_packages {
        Some(path) => load_known_packages(path)?,
        None => Vec::new(),
    };

    let diff = ProfileDiff::with_known_packages(&base, &head, known);
    Ok(CoverageDiffReport::new(diff, options))
}

/// A package row with the identifier made relative to the module root but
/// never truncated.
#[derive(Serialize)]
struct JsonRow {
    package: String,
    base: Option<Coverage>,
    head: Option<Coverage>,
    change: Change,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: String,
    packages: Vec<JsonRow>,
    totals: &'a DiffRow,
}

/// Render the report in the requested style.
pub fn cmd_diff(report: &CoverageDiffReport, style: Style) -> Result<String> {
    let output = match style {
        Style::Text => report.format(&TextFormatter),
        Style::Markdown => report.format(&MarkdownFormatter),
        Style::Json => {
            let root = report.options.module_root.as_deref();
            let json = JsonReport {
                summary: report.summary(),
                packages: report
                    .diff
                    .packages
                    .iter()
                    .map(|row| JsonRow {
                        package: strip_module_root(row.package.as_deref().unwrap_or_default(), root)
                            .to_string(),
                        base: row.base,
                        head: row.head,
                        change: row.change,
                    })
                    .collect(),
                totals: &report.diff.totals,
            };
            let mut out =
                serde_json::to_string_pretty(&json).context("Failed to serialize report")?;
            out.push('\n');
            out
        }
    };
    Ok(output)
}

/// Publish the report as a pull request comment if GitHub is configured.
pub fn cmd_comment(report: &CoverageDiffReport) -> Result<String> {
    let Some(context) = github::Context::from_env() else {
        return Ok("GitHub is not configured; no comment posted.\n".to_string());
    };
    let body = report.format(&MarkdownFormatter);
    let message = match context.publish(&body)? {
        github::Publication::Unchanged => "Coverage comment is already up to date.\n".to_string(),
        github::Publication::Updated(id) => format!("Updated coverage comment {id}.\n"),
        github::Publication::Created => "Created coverage comment.\n".to_string(),
    };
    Ok(message)
}
