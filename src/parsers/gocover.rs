/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each line describes a basic block with the number of statements in it and
/// how many times it was executed. Blocks are grouped by the directory of
/// their file, which is the Go package path. A block with a non-zero count
/// credits all of its statements as covered.
///
/// Parsing is strict: one bad line rejects the whole profile, since dropping
/// it would silently undercount the owning package.
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FormatError, Result};
use crate::model::{Block, Position, Profile};

const HEADER_PREFIX: &str = "mode: ";

/// Pre-compiled pattern for a block line.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:]+):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$").unwrap()
});

/// Parse a Go coverage profile.
pub fn parse(input: &str) -> Result<Profile> {
    let mut lines = input.lines();

    let header = lines.next().ok_or(FormatError::MissingHeader)?;
    let mode = header
        .strip_prefix(HEADER_PREFIX)
        .ok_or_else(|| FormatError::InvalidHeader(header.to_string()))?;

    let mut profile = Profile::new(mode.trim().to_string());

    for (index, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let (path, block) = parse_block_line(line, index + 1)?;
        let (package, _) = split_path(path);
        profile
            .add_block(package, block)
            .map_err(|_| FormatError::StatementOverflow {
                line: index + 1,
                content: line.to_string(),
            })?;
    }

    tracing::debug!(
        mode = %profile.mode,
        packages = profile.packages.len(),
        statements = profile.total_statements,
        covered = profile.covered_statements,
        "parsed coverage profile"
    );

    Ok(profile)
}

/// Parse a single block line, returning the file path it refers to and the block.
///
/// Format: `<file>:<startLine>.<startCol>,<endLine>.<endCol> <numStmt> <count>`
fn parse_block_line(line: &str, line_number: usize) -> Result<(&str, Block)> {
    let caps = BLOCK_RE
        .captures(line)
        .ok_or_else(|| FormatError::MalformedLine {
            line: line_number,
            content: line.to_string(),
        })?;

    let field = |index: usize, name: &'static str| -> Result<u64> {
        parse_number(&caps[index], name, line_number, line)
    };
    let position = |index: usize, name: &'static str| -> Result<u32> {
        parse_number(&caps[index], name, line_number, line)
    };

    let path = caps.get(1).map_or("", |m| m.as_str());
    let (_, file_name) = split_path(path);

    let block = Block {
        file_name: file_name.to_string(),
        start: Position {
            line: position(2, "startLine")?,
            column: position(3, "startCol")?,
        },
        end: Position {
            line: position(4, "endLine")?,
            column: position(5, "endCol")?,
        },
        statement_count: field(6, "statementCount")?,
        hit_count: field(7, "hitCount")?,
    };

    Ok((path, block))
}

fn parse_number<T>(digits: &str, field: &'static str, line: usize, content: &str) -> Result<T>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    digits.parse().map_err(|source| FormatError::InvalidNumber {
        field,
        line,
        content: content.to_string(),
        source,
    })
}

/// Split a source path into (package directory, file name).
///
/// A bare file name belongs to the `.` package, a file at the root to `/`.
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some(("", file)) => ("/", file),
        Some((dir, file)) => (dir, file),
        None => (".", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aggregate, Coverage};

    #[test]
    fn test_parse_empty_profile() {
        assert_eq!(parse(""), Err(FormatError::MissingHeader));
    }

    #[test]
    fn test_parse_invalid_header() {
        assert_eq!(
            parse("wrong: thing"),
            Err(FormatError::InvalidHeader("wrong: thing".to_string()))
        );
        // The space after the colon is part of the prefix.
        assert!(parse("mode:set\n").is_err());
    }

    #[test]
    fn test_parse_only_header() {
        let profile = parse("mode: set").unwrap();
        assert_eq!(profile.mode, "set");
        assert!(profile.packages.is_empty());
        assert_eq!(profile.total_statements, 0);
        assert_eq!(profile.coverage(), None);
    }

    #[test]
    fn test_parse_header_mode_is_trimmed() {
        let profile = parse("mode:  atomic  \n").unwrap();
        assert_eq!(profile.mode, "atomic");
    }

    #[test]
    fn test_parse_single_line() {
        let profile = parse(
            "mode: set\ngithub.com/flipgroup/module/package/file.go:22.39,24.2 1 1\n",
        )
        .unwrap();

        let pkg = profile
            .package("github.com/flipgroup/module/package")
            .unwrap();
        assert_eq!(pkg.blocks.len(), 1);
        let block = &pkg.blocks[0];
        assert_eq!(block.file_name, "file.go");
        assert_eq!(block.start, Position { line: 22, column: 39 });
        assert_eq!(block.end, Position { line: 24, column: 2 });
        assert_eq!(block.statement_count, 1);
        assert_eq!(block.hit_count, 1);
    }

    #[test]
    fn test_parse_malformed_line() {
        let input = "mode: set\n\
            github.com/flipgroup/module/package/file.go:22.39,24.2 1 1\n\
            github.com/flipgroup/module/package/file.go:22.39,24.2 1 BLURG\n";
        match parse(input) {
            Err(FormatError::MalformedLine { line, content }) => {
                assert_eq!(line, 2);
                assert!(content.ends_with("1 BLURG"));
            }
            other => panic!("expected malformed line error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        assert!(parse("mode: set\nfoo.go:1.1,2.2 3 1 extra\n").is_err());
        assert!(parse("mode: set\nfoo.go:1.1,2.2 -3 1\n").is_err());
        assert!(parse("mode: set\nC:/foo.go:1.1,2.2 3 1\n").is_err());
    }

    #[test]
    fn test_parse_number_overflow() {
        let input = "mode: count\nfoo.go:99999999999,1.1 1 1\n";
        assert!(matches!(parse(input), Err(FormatError::MalformedLine { .. })));

        let input = "mode: count\nfoo.go:99999999999.1,2.1 1 1\n";
        match parse(input) {
            Err(FormatError::InvalidNumber { field, line, .. }) => {
                assert_eq!(field, "startLine");
                assert_eq!(line, 1);
            }
            other => panic!("expected invalid number error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_statement_count_overflow() {
        let input = "mode: set\n\
            a/f.go:1.1,2.2 18446744073709551615 1\n\
            a/f.go:3.1,4.2 1 1\n";
        match parse(input) {
            Err(FormatError::StatementOverflow { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "a/f.go:3.1,4.2 1 1");
            }
            other => panic!("expected statement overflow error, got {other:?}"),
        }

        // A single block at the limit is still fine.
        let profile = parse("mode: set\na/f.go:1.1,2.2 18446744073709551615 0\n").unwrap();
        assert_eq!(profile.total_statements, u64::MAX);
        assert_eq!(profile.covered_statements, 0);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let input = "mode: set\n\nfoo/a.go:1.1,2.2 3 1\r\n\n";
        let profile = parse(input).unwrap();
        assert_eq!(profile.total_statements, 3);
    }

    #[test]
    fn test_parse_valid_lines() {
        let input = "mode: set
github.com/flipgroup/module/package/file.go:22.39,24.2 5 1
github.com/flipgroup/module/package/file.go:44.39,24.2 3 0
github.com/flipgroup/module/package/file.go:66.39,24.2 2 1
github.com/flipgroup/module/package/file.go:88.39,24.2 1 0
github.com/flipgroup/module/another/file.go:22.39,24.2 20 1
github.com/flipgroup/module/another/file.go:44.39,24.2 40 1
github.com/flipgroup/module/another/file.go:66.39,24.2 60 0
github.com/flipgroup/module/another/file.go:88.39,24.2 80 0
";
        let profile = parse(input).unwrap();

        assert_eq!(profile.total_statements, 211);
        assert_eq!(profile.covered_statements, 67);
        assert_eq!(profile.coverage(), Some(Coverage::from_hundredths(3175)));

        let pkg = profile
            .package("github.com/flipgroup/module/package")
            .unwrap();
        assert_eq!(pkg.total_statements, 11);
        assert_eq!(pkg.covered_statements, 7);
        assert_eq!(pkg.coverage(), Some(Coverage::from_hundredths(6363)));
        let starts: Vec<u32> = pkg.blocks.iter().map(|b| b.start.line).collect();
        assert_eq!(starts, vec![22, 44, 66, 88]);

        let pkg = profile
            .package("github.com/flipgroup/module/another")
            .unwrap();
        assert_eq!(pkg.total_statements, 200);
        assert_eq!(pkg.covered_statements, 60);
        assert_eq!(pkg.coverage(), Some(Coverage::from_hundredths(3000)));
    }

    #[test]
    fn test_parse_zero_statement_block() {
        let profile = parse("mode: count\nfoo/a.go:1.1,1.5 0 4\n").unwrap();
        let pkg = profile.package("foo").unwrap();
        assert_eq!(pkg.blocks.len(), 1);
        assert_eq!(pkg.coverage(), None);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("example.com/pkg/f.go"), ("example.com/pkg", "f.go"));
        assert_eq!(split_path("f.go"), (".", "f.go"));
        assert_eq!(split_path("/f.go"), ("/", "f.go"));
    }
}
