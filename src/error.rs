use std::num::ParseIntError;

use thiserror::Error;

/// A coverage profile that does not follow the `mode:` header + block line format.
///
/// Line numbers are 1-based and counted from the first line after the header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("missing header: profile is empty")]
    MissingHeader,

    #[error("invalid header: profile must start with [mode: ], got {0:?}")]
    InvalidHeader(String),

    #[error("malformed coverage line {line}: {content}")]
    MalformedLine { line: usize, content: String },

    #[error("invalid {field} on line {line} ({content}): {source}")]
    InvalidNumber {
        field: &'static str,
        line: usize,
        content: String,
        source: ParseIntError,
    },

    #[error("statement count overflow on line {line}: {content}")]
    StatementOverflow { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, FormatError>;
