/// Compare two coverage profiles package by package.
///
/// The set of packages is the union of both profiles (plus any packages the
/// caller knows about but neither profile mentions), sorted by identifier so
/// the output is reproducible regardless of hash-map iteration order.
use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Aggregate, Coverage, Profile};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// How a package's coverage moved between base and head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "delta", rename_all = "snake_case")]
pub enum Change {
    /// Neither side has any statements to compare.
    NoData,
    /// Only head has coverage: the package appeared.
    New,
    /// Only base has coverage: the package disappeared.
    Removed,
    /// Both sides have coverage; head minus base in hundredths of a point.
    Delta(i64),
}

impl Change {
    #[must_use]
    pub fn between(base: Option<Coverage>, head: Option<Coverage>) -> Self {
        match (base, head) {
            (None, None) => Change::NoData,
            (None, Some(_)) => Change::New,
            (Some(_), None) => Change::Removed,
            (Some(base), Some(head)) => Change::Delta(base.delta_to(head)),
        }
    }

    #[must_use]
    pub fn is_improvement(self) -> bool {
        matches!(self, Change::Delta(d) if d > 0)
    }

    #[must_use]
    pub fn is_regression(self) -> bool {
        matches!(self, Change::Delta(d) if d < 0)
    }

    #[must_use]
    pub fn is_unchanged(self) -> bool {
        self == Change::Delta(0)
    }
}

/// One line of the comparison: a package, or the whole profile when
/// `package` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub package: Option<String>,
    pub base: Option<Coverage>,
    pub head: Option<Coverage>,
    pub change: Change,
}

impl DiffRow {
    fn new(package: Option<String>, base: Option<Coverage>, head: Option<Coverage>) -> Self {
        Self {
            package,
            base,
            head,
            change: Change::between(base, head),
        }
    }

    #[must_use]
    pub fn is_totals(&self) -> bool {
        self.package.is_none()
    }
}

/// Full comparison of two profiles: sorted package rows plus the totals row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileDiff {
    pub packages: Vec<DiffRow>,
    pub totals: DiffRow,
}

impl ProfileDiff {
    /// Compare `base` against `head`.
    #[must_use]
    pub fn between(base: &Profile, head: &Profile) -> Self {
        Self::with_known_packages(base, head, std::iter::empty::<String>())
    }

    /// Compare `base` against `head`, also listing `known` packages that may
    /// be missing from both profiles (e.g. packages without any tests).
    #[must_use]
    pub fn with_known_packages<I, S>(base: &Profile, head: &Profile, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> = known.into_iter().map(Into::into).collect();
        names.extend(base.packages.keys().cloned());
        names.extend(head.packages.keys().cloned());

        let packages: Vec<DiffRow> = names
            .into_iter()
            .map(|name| {
                let base_cov = base.package(&name).and_then(|p| p.coverage());
                let head_cov = head.package(&name).and_then(|p| p.coverage());
                DiffRow::new(Some(name), base_cov, head_cov)
            })
            .collect();

        let totals = totals(base, head);

        tracing::debug!(
            packages = packages.len(),
            improved = packages.iter().filter(|r| r.change.is_improvement()).count(),
            regressed = packages.iter().filter(|r| r.change.is_regression()).count(),
            "compared coverage profiles"
        );

        Self { packages, totals }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Per-package rows for every package in either profile, sorted by identifier.
#[must_use]
pub fn diff(base: &Profile, head: &Profile) -> Vec<DiffRow> {
    ProfileDiff::between(base, head).packages
}

/// Totals row computed from each profile's own statement counts.
#[must_use]
pub fn totals(base: &Profile, head: &Profile) -> DiffRow {
    DiffRow::new(None, base.coverage(), head.coverage())
}
