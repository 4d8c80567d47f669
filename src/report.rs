//! Output formatting for coverage diffs.

use std::fmt::Write;

use crate::diff::{Change, DiffRow, ProfileDiff};
use crate::model::Coverage;

/// Width of the package column; longer identifiers are truncated.
pub const PACKAGE_COLUMN_WIDTH: usize = 80;

/// Heading that opens every comment body, also used to find our own comment.
pub const COMMENT_MARKER: &str = "### coverage diff";

const VALUE_COLUMN_WIDTH: usize = 8;

/// Knobs for rendering the table.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Module path stripped from package identifiers (e.g. from `go.mod`).
    pub module_root: Option<String>,
    /// Leave the delta blank for packages whose coverage did not move.
    /// Never applies to the totals row.
    pub hide_zero_delta: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_root: None,
            hide_zero_delta: true,
        }
    }
}

/// A diff plus the options to render it with.
pub struct CoverageDiffReport {
    pub diff: ProfileDiff,
    pub options: RenderOptions,
}

impl CoverageDiffReport {
    #[must_use]
    pub fn new(diff: ProfileDiff, options: RenderOptions) -> Self {
        Self { diff, options }
    }

    /// One-line description of the change in total coverage.
    #[must_use]
    pub fn summary(&self) -> String {
        summarize(self.diff.totals.base, self.diff.totals.head)
    }

    /// Fixed-width comparison table.
    #[must_use]
    pub fn table(&self) -> String {
        render_table(&self.diff, &self.options)
    }

    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }
}

/// Trait for formatting coverage diff reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &CoverageDiffReport) -> String;
}

/// Summary line followed by the table, for terminals and CI logs.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &CoverageDiffReport) -> String {
        format!("{}\n\n{}\n", report.summary(), report.table())
    }
}

/// Pull request comment body.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &CoverageDiffReport) -> String {
        comment_body(&report.summary(), &report.table())
    }
}

/// Wrap a summary and table into the comment posted on a pull request.
#[must_use]
pub fn comment_body(summary: &str, table: &str) -> String {
    format!("{COMMENT_MARKER}\n{summary}\n\n```\n{table}\n```\n")
}

/// Render the per-package rows and the totals row as a fixed-width table.
///
/// Lines are joined with `\n` without a trailing newline.
#[must_use]
pub fn render_table(diff: &ProfileDiff, options: &RenderOptions) -> String {
    let mut out = String::new();
    let root = options.module_root.as_deref();

    write_row(&mut out, "package", "before", "after", "delta");
    write_row(&mut out, "-------", "-------", "-------", "-------");

    for row in &diff.packages {
        let name = relative_package(row.package.as_deref().unwrap_or_default(), root);
        write_row(
            &mut out,
            &name,
            &format_coverage(row.base),
            &format_coverage(row.head),
            &format_change(row.change, options.hide_zero_delta),
        );
    }

    write_totals(&mut out, &diff.totals);
    out
}

fn write_row(out: &mut String, name: &str, before: &str, after: &str, delta: &str) {
    writeln!(
        out,
        "{name:<pw$} {before:>w$} {after:>w$} {delta:>w$}",
        pw = PACKAGE_COLUMN_WIDTH,
        w = VALUE_COLUMN_WIDTH,
    )
    .unwrap();
}

fn write_totals(out: &mut String, totals: &DiffRow) {
    write!(
        out,
        "{:>pw$} {:>w$} {:>w$} {:>w$}",
        "total:",
        format_coverage(totals.base),
        format_coverage(totals.head),
        format_change(totals.change, false),
        pw = PACKAGE_COLUMN_WIDTH,
        w = VALUE_COLUMN_WIDTH,
    )
    .unwrap();
}

/// `37.50%` for a defined coverage, `-` when there is no data.
#[must_use]
pub fn format_coverage(coverage: Option<Coverage>) -> String {
    match coverage {
        Some(c) => c.to_string(),
        None => "-".to_string(),
    }
}

/// Signed percentage-point delta from hundredths, e.g. `+7.92%` or `-0.05%`.
#[must_use]
pub fn format_delta(hundredths: i64) -> String {
    let sign = if hundredths < 0 { '-' } else { '+' };
    let abs = hundredths.unsigned_abs();
    format!("{sign}{}.{:02}%", abs / 100, abs % 100)
}

/// Text for the delta column.
#[must_use]
pub fn format_change(change: Change, hide_zero_delta: bool) -> String {
    match change {
        Change::NoData => "n/a".to_string(),
        Change::New => "new".to_string(),
        Change::Removed => "gone".to_string(),
        Change::Delta(0) if hide_zero_delta => String::new(),
        Change::Delta(d) => format_delta(d),
    }
}

/// Describe the change in total coverage in one sentence.
///
/// A side without data counts as 0.00% when the other side has data.
#[must_use]
pub fn summarize(base: Option<Coverage>, head: Option<Coverage>) -> String {
    if base == head {
        return "Coverage unchanged.".to_string();
    }
    let zero = Coverage::from_hundredths(0);
    let delta = base.unwrap_or(zero).delta_to(head.unwrap_or(zero));
    let amount = format_delta(delta);
    let amount = &amount[1..];
    match delta {
        d if d < 0 => format!("Coverage decreased by {amount}."),
        d if d > 0 => format!("Coverage increased by {amount}."),
        _ => "Coverage unchanged.".to_string(),
    }
}

/// Package identifier relative to `root` when it lives under it, `"."` for
/// the root package itself.
#[must_use]
pub fn strip_module_root<'a>(package: &'a str, root: Option<&str>) -> &'a str {
    let root = root.map(|r| r.trim_end_matches('/')).filter(|r| !r.is_empty());

    match root.and_then(|r| package.strip_prefix(r)) {
        Some("") => ".",
        Some(rest) => rest.strip_prefix('/').unwrap_or(package),
        None => package,
    }
}

/// Package identifier as shown in the table: see [`strip_module_root`], then
/// cut down to [`PACKAGE_COLUMN_WIDTH`] characters.
#[must_use]
pub fn relative_package(package: &str, root: Option<&str>) -> String {
    strip_module_root(package, root)
        .chars()
        .take(PACKAGE_COLUMN_WIDTH)
        .collect()
}
