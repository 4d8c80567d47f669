//! In-memory representation of a Go coverage profile: profile → package → block.
//! The parser builds it once and nothing mutates it afterwards.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Hundredths of a percent in a fully covered aggregate.
const FULL_SCALE: u64 = 10_000;

/// Compute the exact covered/total rate, returning `None` when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> Option<f64> {
    if total < 1 {
        None
    } else {
        Some(covered as f64 / total as f64)
    }
}

/// Coverage expressed in hundredths of a percent, so `37.50%` is stored as `3750`.
///
/// Values are truncated, never rounded, which keeps deltas between two
/// coverages identical to the difference of what gets printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Coverage(u64);

impl Coverage {
    #[must_use]
    pub const fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    /// Fixed-point coverage of `covered` out of `total` statements, `None` when
    /// there is nothing to cover.
    #[must_use]
    pub fn from_counts(covered: u64, total: u64) -> Option<Self> {
        if total < 1 {
            return None;
        }
        let scaled = u128::from(covered) * u128::from(FULL_SCALE) / u128::from(total);
        Some(Self(u64::try_from(scaled).unwrap_or(u64::MAX)))
    }

    #[must_use]
    pub const fn hundredths(self) -> u64 {
        self.0
    }

    /// Signed change from `self` to `other` in hundredths of a percentage point.
    #[must_use]
    pub fn delta_to(self, other: Coverage) -> i64 {
        let from = i64::try_from(self.0).unwrap_or(i64::MAX);
        let to = i64::try_from(other.0).unwrap_or(i64::MAX);
        to.saturating_sub(from)
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Error returned when a string is not a rendered coverage like `"41.25%"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coverage percentage: {0:?}")]
pub struct ParseCoverageError(String);

impl FromStr for Coverage {
    type Err = ParseCoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseCoverageError(s.to_string());
        let number = s.trim().strip_suffix('%').ok_or_else(invalid)?;
        let (whole, frac) = number.split_once('.').unwrap_or((number, "00"));
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if frac.len() != 2 || !digits(whole) || !digits(frac) {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac: u64 = frac.parse().map_err(|_| invalid())?;
        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

/// A statement counter would exceed `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("statement count overflow")]
pub struct CountOverflow;

/// Counters after adding `block`: total always, covered only when it was hit.
fn credit(total: u64, covered: u64, block: &Block) -> Result<(u64, u64), CountOverflow> {
    let total = total.checked_add(block.statement_count).ok_or(CountOverflow)?;
    let covered = if block.is_covered() {
        covered.checked_add(block.statement_count).ok_or(CountOverflow)?
    } else {
        covered
    };
    Ok((total, covered))
}

/// Anything that counts total and covered statements.
pub trait Aggregate {
    fn total_statements(&self) -> u64;
    fn covered_statements(&self) -> u64;

    /// Fixed-point coverage, `None` when the aggregate has no statements.
    fn coverage(&self) -> Option<Coverage> {
        Coverage::from_counts(self.covered_statements(), self.total_statements())
    }

    /// Exact covered/total ratio, `None` when the aggregate has no statements.
    fn rate(&self) -> Option<f64> {
        rate(self.covered_statements(), self.total_statements())
    }
}

/// A (line, column) position in a source file, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// One statement range from the profile. The end position is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Base name of the source file; its directory is the owning package.
    pub file_name: String,
    pub start: Position,
    pub end: Position,
    pub statement_count: u64,
    pub hit_count: u64,
}

impl Block {
    /// Any hit at all counts the whole range as covered.
    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.hit_count > 0
    }
}

/// Coverage for a single Go package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub blocks: Vec<Block>,
    pub total_statements: u64,
    pub covered_statements: u64,
}

impl Package {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Append a block, crediting its statements to this package's counters.
    ///
    /// Leaves the package untouched if either counter would overflow.
    pub(crate) fn push(&mut self, block: Block) -> Result<(), CountOverflow> {
        let (total, covered) =
            credit(self.total_statements, self.covered_statements, &block)?;
        self.total_statements = total;
        self.covered_statements = covered;
        self.blocks.push(block);
        Ok(())
    }
}

impl Aggregate for Package {
    fn total_statements(&self) -> u64 {
        self.total_statements
    }

    fn covered_statements(&self) -> u64 {
        self.covered_statements
    }
}

/// The complete result of parsing one coverage profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Value of the `mode:` header (`set`, `count` or `atomic`), kept verbatim.
    pub mode: String,
    pub packages: HashMap<String, Package>,
    pub total_statements: u64,
    pub covered_statements: u64,
}

impl Profile {
    pub fn new(mode: String) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Record a block under `package`, creating the package on first sight.
    ///
    /// Fails without recording anything if a counter would overflow.
    pub(crate) fn add_block(&mut self, package: &str, block: Block) -> Result<(), CountOverflow> {
        let (total, covered) =
            credit(self.total_statements, self.covered_statements, &block)?;
        match self.packages.get_mut(package) {
            Some(pkg) => pkg.push(block)?,
            None => {
                let mut pkg = Package::new(package.to_string());
                pkg.push(block)?;
                self.packages.insert(package.to_string(), pkg);
            }
        }
        self.total_statements = total;
        self.covered_statements = covered;
        Ok(())
    }

    #[must_use]
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }
}

impl Aggregate for Profile {
    fn total_statements(&self) -> u64 {
        self.total_statements
    }

    fn covered_statements(&self) -> u64 {
        self.covered_statements
    }
}
