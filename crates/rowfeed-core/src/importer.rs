//! The importer-side outcome surface.

use std::any::Any;

use rowfeed_model::{ParseError, Value};

use crate::deps::Dependencies;
use crate::error::ImportError;
use crate::parsers::ParserRegistry;
use crate::row::ParsedRow;

/// A per-row error collected or forwarded under the error policy.
#[derive(Debug)]
pub struct ErrorRow {
    pub error: ImportError,
    /// File line number of the offending record.
    pub line_number: u64,
    /// The record re-serialized as CSV.
    pub csv_string: String,
}

/// Caller-owned state for one import: dependency bindings, custom named
/// parsers, and the default outcome collections the runner appends to.
///
/// Storage for rows that import successfully belongs to the row handler,
/// not to this struct — the runner never sees them.
#[derive(Default)]
pub struct Importer {
    pub skipped_rows: Vec<ParsedRow>,
    pub aborted_rows: Vec<ParsedRow>,
    pub error_rows: Vec<ErrorRow>,
    /// Set when a run terminates on an abort-import signal.
    pub aborted: bool,
    pub abort_message: Option<String>,
    dependencies: Dependencies,
    parsers: ParserRegistry,
}

impl Importer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a dependency declared on the schema.
    pub fn bind<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.dependencies.insert(name, value);
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Registers a named parser alongside the built-ins.
    pub fn register_parser<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&str, Option<&str>) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        self.parsers.register(name, parser);
    }

    pub(crate) fn registry(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Empties the outcome collections and clears the abort state,
    /// leaving bindings and parsers in place. A rewound source plus
    /// cleared outcomes reproduces a fresh run exactly.
    pub fn clear_outcomes(&mut self) {
        self.skipped_rows.clear();
        self.aborted_rows.clear();
        self.error_rows.clear();
        self.aborted = false;
        self.abort_message = None;
    }
}
