//! Import definitions: schema plus hooks.
//!
//! An [`ImportBuilder`] pairs the column schema with the handlers and
//! policies that drive a run. Flow control is a value, not an exception:
//! the row handler returns a [`RowFlow`] telling the runner what to do
//! next, and anything that is a genuine error travels in the `Result`'s
//! error channel instead.

use rowfeed_model::{ColumnDef, Policy, Schema, SchemaBuilder, SchemaError};

use crate::deps::Dependencies;
use crate::error::ImportError;
use crate::importer::Importer;
use crate::row::{ParsedRow, RowView};
use crate::runner::FileContext;

/// The flow-control signal a row handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFlow {
    /// The handler finished with the row; iteration continues.
    Continue,
    /// Abandon the row silently: no outcome is recorded anywhere.
    Next,
    /// Classify the row as skipped, with an optional message.
    Skip(Option<String>),
    /// Classify the row as aborted, with an optional message.
    AbortRow(Option<String>),
    /// Terminate the whole run. The message becomes the import's abort
    /// reason.
    AbortImport(String),
}

/// Terminal flow of a run or of a whole-file handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportFlow {
    Completed,
    Abort(String),
}

pub type RowHandler =
    Box<dyn FnMut(&mut RowView<'_>, &Dependencies) -> Result<RowFlow, ImportError>>;
pub type FileHandler =
    Box<dyn FnMut(&mut FileContext<'_, '_>) -> Result<ImportFlow, ImportError>>;
/// Custom error disposition: `(error, line_number, csv_string, importer)`.
pub type ErrorHandler = Box<dyn FnMut(&ImportError, u64, &str, &mut Importer)>;
/// Custom skipped/aborted-row disposition.
pub type RowOutcomeHandler = Box<dyn FnMut(ParsedRow, &mut Importer)>;

pub(crate) struct Hooks {
    pub row: Option<RowHandler>,
    pub file: Option<FileHandler>,
    pub errors: Policy<ErrorHandler>,
    pub skipped: Policy<RowOutcomeHandler>,
    pub aborted: Policy<RowOutcomeHandler>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            row: None,
            file: None,
            errors: Policy::Default,
            skipped: Policy::Default,
            aborted: Policy::Default,
        }
    }
}

/// A finalized import: immutable schema plus the hooks the runner
/// dispatches to.
pub struct ImportDefinition {
    pub(crate) schema: Schema,
    pub(crate) hooks: Hooks,
}

impl ImportDefinition {
    pub fn builder() -> ImportBuilder {
        ImportBuilder::new()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Accumulates columns, dependencies, and hooks for an import.
#[derive(Default)]
pub struct ImportBuilder {
    schema: SchemaBuilder,
    hooks: Hooks,
}

impl ImportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing schema builder (e.g. one produced from a
    /// configuration document).
    pub fn from_schema(schema: SchemaBuilder) -> Self {
        Self {
            schema,
            hooks: Hooks::default(),
        }
    }

    /// Declares a column; duplicate and reserved names fail immediately.
    pub fn column(mut self, def: ColumnDef) -> Result<Self, SchemaError> {
        self.schema = self.schema.column(def)?;
        Ok(self)
    }

    /// Declares a dependency the importer must bind before the run.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.schema = self.schema.depends_on(name);
        self
    }

    /// The per-row handler.
    #[must_use]
    pub fn rows<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut RowView<'_>, &Dependencies) -> Result<RowFlow, ImportError> + 'static,
    {
        self.hooks.row = Some(Box::new(handler));
        self
    }

    /// A whole-file handler. When set, the runner hands the entire run to
    /// it instead of iterating rows itself.
    #[must_use]
    pub fn file<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut FileContext<'_, '_>) -> Result<ImportFlow, ImportError> + 'static,
    {
        self.hooks.file = Some(Box::new(handler));
        self
    }

    /// Collect per-row errors instead of propagating them.
    #[must_use]
    pub fn ignore_errors(mut self) -> Self {
        self.hooks.errors = Policy::Ignore;
        self
    }

    /// Delegate per-row errors to a custom handler.
    #[must_use]
    pub fn on_errors<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&ImportError, u64, &str, &mut Importer) + 'static,
    {
        self.hooks.errors = Policy::Custom(Box::new(handler));
        self
    }

    /// Drop skipped rows instead of collecting them.
    #[must_use]
    pub fn ignore_skipped_rows(mut self) -> Self {
        self.hooks.skipped = Policy::Ignore;
        self
    }

    /// Delegate skipped rows to a custom handler.
    #[must_use]
    pub fn on_skipped_rows<F>(mut self, handler: F) -> Self
    where
        F: FnMut(ParsedRow, &mut Importer) + 'static,
    {
        self.hooks.skipped = Policy::Custom(Box::new(handler));
        self
    }

    /// Drop aborted rows instead of collecting them.
    #[must_use]
    pub fn ignore_aborted_rows(mut self) -> Self {
        self.hooks.aborted = Policy::Ignore;
        self
    }

    /// Delegate aborted rows to a custom handler.
    #[must_use]
    pub fn on_aborted_rows<F>(mut self, handler: F) -> Self
    where
        F: FnMut(ParsedRow, &mut Importer) + 'static,
    {
        self.hooks.aborted = Policy::Custom(Box::new(handler));
        self
    }

    pub fn build(self) -> Result<ImportDefinition, SchemaError> {
        Ok(ImportDefinition {
            schema: self.schema.build()?,
            hooks: self.hooks,
        })
    }
}
