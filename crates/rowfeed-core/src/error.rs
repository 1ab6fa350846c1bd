//! Import error taxonomy.

use thiserror::Error;

use rowfeed_ingest::IngestError;

/// Errors surfaced by the import runner.
///
/// The first five variants are configuration errors: they fire during the
/// precondition checks, before any data row is touched, and always reach
/// the caller. `Parse` and `Other` are per-row errors whose disposition is
/// governed by the error policy. `Ingest` wraps source errors; a malformed
/// input is never absorbed by policy.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no row or file handler has been configured")]
    MissingRowHandler,
    #[error("unknown parser '{parser}' for column '{column}'")]
    UnknownParser { parser: String, column: String },
    #[error("missing dependencies: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("file handler returned without importing any rows")]
    RowsNotImported,
    #[error("column '{0}' is not declared in the schema")]
    UnknownColumn(String),
    #[error("could not parse column '{column}' on row {row_number}: {message}")]
    Parse {
        column: String,
        row_number: u64,
        message: String,
    },
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ImportError {
    /// Wraps an arbitrary handler error.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(err.into())
    }
}
