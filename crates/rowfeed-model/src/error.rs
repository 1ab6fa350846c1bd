//! Error types for schema construction and value parsing.

use thiserror::Error;

/// Errors raised while a schema is being declared.
///
/// These are configuration errors: they fire at declaration time, before
/// any input row has been read.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("column '{0}' has already been declared")]
    DuplicateColumn(String),
    #[error("'{name}' is a reserved column name (reserved: {reserved:?})")]
    ReservedColumnName {
        name: String,
        reserved: &'static [&'static str],
    },
    #[error("invalid header pattern for column '{column}': {source}")]
    InvalidHeaderPattern {
        column: String,
        #[source]
        source: regex::Error,
    },
}

/// A value-level parse failure, raised by a column parser.
///
/// Carries only the message; the import runner attaches column and row
/// context when it surfaces the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
