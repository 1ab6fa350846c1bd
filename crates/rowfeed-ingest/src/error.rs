//! Ingest error types.

use thiserror::Error;

/// Errors raised while reading records from a source.
///
/// `Malformed` is the distinguished structural error: downstream policy
/// never reclassifies it, it always terminates an import.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed input at line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("input has no header row")]
    MissingHeaderRow,
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        if err.is_io_error() {
            return match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                _ => Self::Io(std::io::Error::other("csv reader io error")),
            };
        }
        Self::Malformed { line, source: err }
    }
}
