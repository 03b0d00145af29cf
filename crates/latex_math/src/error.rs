//! Error types for the latex_math crate

use thiserror::Error;

/// The category of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Braces do not match, or input was left unconsumed
    MismatchBraces,
    /// A `\command` that is not known
    InvalidCommand,
    /// An expected character was not found
    CharacterNotFound,
    /// `\left` or `\right` without a delimiter after it
    MissingDelimiter,
    /// A delimiter name that is not in the delimiter table
    InvalidDelimiter,
    /// `\left` without a matching `\right`
    MissingRight,
    /// `\right` without a matching `\left`
    MissingLeft,
    /// Unknown environment name
    InvalidEnv,
    /// An environment was expected (e.g. `\\` inside `\left..\right`)
    MissingEnv,
    /// `\end` without a `\begin`
    MissingBegin,
    /// `\begin` without a matching `\end`
    MissingEnd,
    /// The environment was given the wrong number of columns
    InvalidNumColumns,
    /// `\limits` / `\nolimits` not following a large operator
    InvalidLimits,
    /// An internal invariant was violated while parsing
    InternalError,
}

/// A parse failure with a message and the cursor offset it was recorded at
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at offset {offset})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            offset,
        }
    }
}

/// Errors that can occur in math operations
#[derive(Error, Debug)]
pub enum MathError {
    /// The LaTeX source could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A math table is missing data or is inconsistent
    #[error("Math table error: {0}")]
    MathTable(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading a math table or config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for math operations
pub type MathResult<T> = Result<T, MathError>;
