//! The import runner.
//!
//! Drives a run through its states: precondition checks, then either
//! row-by-row iteration or a delegated whole-file handler, ending in
//! completion or abort. Per-row classification follows the flow-control
//! signal the row handler returns; configuration and malformed-input
//! errors always surface to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use rowfeed_ingest::{RecordSource, SourceRecord};
use rowfeed_model::{ParserFn, Policy};

use crate::definition::{ErrorHandler, ImportDefinition, ImportFlow, RowFlow, RowOutcomeHandler};
use crate::deps::Dependencies;
use crate::error::ImportError;
use crate::headers::{ResolvedHeaders, resolve_headers};
use crate::importer::{ErrorRow, Importer};
use crate::row::RowView;

/// Executes one import definition against one record source.
///
/// `run` returns `Ok(true)` when the input was fully consumed, and
/// `Ok(false)` when a handler raised abort-import — in that case the
/// importer's `aborted` flag and `abort_message` are populated. Every
/// other failure is an `Err`.
pub struct Runner<'a> {
    source: &'a mut dyn RecordSource,
    definition: ImportDefinition,
    importer: &'a mut Importer,
    resolved_parsers: BTreeMap<String, Arc<ParserFn>>,
    resolved_headers: ResolvedHeaders,
    row_number: u64,
    rows_imported: bool,
}

impl<'a> Runner<'a> {
    pub fn new(
        source: &'a mut dyn RecordSource,
        definition: ImportDefinition,
        importer: &'a mut Importer,
    ) -> Self {
        Self {
            source,
            definition,
            importer,
            resolved_parsers: BTreeMap::new(),
            resolved_headers: ResolvedHeaders::default(),
            row_number: 0,
            rows_imported: false,
        }
    }

    /// The literal headers each schema column resolved to. Populated
    /// during `run`.
    pub fn resolved_headers(&self) -> &ResolvedHeaders {
        &self.resolved_headers
    }

    /// The importer this runner reports outcomes to.
    pub fn importer(&self) -> &Importer {
        self.importer
    }

    pub fn importer_mut(&mut self) -> &mut Importer {
        self.importer
    }

    pub fn run(&mut self) -> Result<bool, ImportError> {
        self.row_number = 0;
        self.rows_imported = false;

        self.check_handler_configured()?;
        self.resolve_named_parsers()?;
        self.check_dependencies()?;
        self.initialize_headers()?;
        self.check_required_columns()?;

        let flow = if self.definition.hooks.file.is_some() {
            self.run_file_mode()?
        } else {
            self.import_rows()?
        };

        match flow {
            ImportFlow::Completed => {
                tracing::info!(
                    rows = self.row_number,
                    skipped = self.importer.skipped_rows.len(),
                    aborted_rows = self.importer.aborted_rows.len(),
                    errors = self.importer.error_rows.len(),
                    "import completed"
                );
                Ok(true)
            }
            ImportFlow::Abort(message) => {
                tracing::warn!(message = %message, "import aborted");
                self.importer.aborted = true;
                self.importer.abort_message = Some(message);
                Ok(false)
            }
        }
    }

    fn check_handler_configured(&self) -> Result<(), ImportError> {
        if self.definition.hooks.row.is_none() && self.definition.hooks.file.is_none() {
            return Err(ImportError::MissingRowHandler);
        }
        Ok(())
    }

    fn resolve_named_parsers(&mut self) -> Result<(), ImportError> {
        let registry = self.importer.registry();
        let mut resolved = BTreeMap::new();
        for spec in self.definition.schema.columns() {
            let parser = registry.resolve(&spec.parser).ok_or_else(|| {
                let name = match &spec.parser {
                    rowfeed_model::ParserRef::Named(name) => name.clone(),
                    rowfeed_model::ParserRef::Inline(_) => "<inline>".to_string(),
                };
                ImportError::UnknownParser {
                    parser: name,
                    column: spec.name.clone(),
                }
            })?;
            resolved.insert(spec.name.clone(), parser);
        }
        self.resolved_parsers = resolved;
        Ok(())
    }

    fn check_dependencies(&self) -> Result<(), ImportError> {
        let missing: Vec<String> = self
            .definition
            .schema
            .dependencies()
            .iter()
            .filter(|name| !self.importer.dependencies().contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingDependencies(missing));
        }
        Ok(())
    }

    fn initialize_headers(&mut self) -> Result<(), ImportError> {
        self.source.rewind()?;
        let literal = self.source.headers().to_vec();
        self.resolved_headers = resolve_headers(&self.definition.schema, &literal);
        Ok(())
    }

    fn check_required_columns(&self) -> Result<(), ImportError> {
        let missing = self.resolved_headers.missing_required(&self.definition.schema);
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }
        Ok(())
    }

    fn run_file_mode(&mut self) -> Result<ImportFlow, ImportError> {
        let mut handler = self
            .definition
            .hooks
            .file
            .take()
            .ok_or(ImportError::MissingRowHandler)?;
        let result = handler(&mut FileContext { runner: self });
        self.definition.hooks.file = Some(handler);

        let flow = result?;
        // The handler must leave evidence that rows were actually
        // imported; returning without doing so is a configuration misuse.
        if flow == ImportFlow::Completed && !self.rows_imported {
            return Err(ImportError::RowsNotImported);
        }
        Ok(flow)
    }

    fn import_rows(&mut self) -> Result<ImportFlow, ImportError> {
        loop {
            // Malformed input propagates verbatim; it is never subject to
            // the per-row error policy.
            let Some(record) = self.source.next_record()? else {
                break;
            };
            if let ImportFlow::Abort(message) = self.import_row(record)? {
                return Ok(ImportFlow::Abort(message));
            }
        }
        self.rows_imported = true;
        Ok(ImportFlow::Completed)
    }

    fn import_row(&mut self, record: SourceRecord) -> Result<ImportFlow, ImportError> {
        self.row_number += 1;
        let line_number = record.line;
        let mut row = RowView::new(
            record,
            self.row_number,
            &self.definition.schema,
            &self.resolved_headers,
            &self.resolved_parsers,
        );
        let handler = self
            .definition
            .hooks
            .row
            .as_mut()
            .ok_or(ImportError::MissingRowHandler)?;

        match handler(&mut row, self.importer.dependencies()) {
            Ok(RowFlow::Continue | RowFlow::Next) => Ok(ImportFlow::Completed),
            Ok(RowFlow::Skip(message)) => {
                handle_skipped_row(&mut self.definition.hooks.skipped, self.importer, row, message);
                Ok(ImportFlow::Completed)
            }
            Ok(RowFlow::AbortRow(message)) => {
                handle_aborted_row(&mut self.definition.hooks.aborted, self.importer, row, message);
                Ok(ImportFlow::Completed)
            }
            Ok(RowFlow::AbortImport(message)) => Ok(ImportFlow::Abort(message)),
            Err(error) => {
                let csv_string = row.csv_string().to_string();
                handle_error(
                    &mut self.definition.hooks.errors,
                    self.importer,
                    error,
                    line_number,
                    csv_string,
                )?;
                Ok(ImportFlow::Completed)
            }
        }
    }
}

// Outcome dispatch works on the hook and importer alone so a live
// RowView (which borrows the runner's schema and header state) can be
// handed over without conflicting borrows.

fn handle_skipped_row(
    policy: &mut Policy<RowOutcomeHandler>,
    importer: &mut Importer,
    mut row: RowView<'_>,
    message: Option<String>,
) {
    match policy {
        Policy::Ignore => {}
        Policy::Default => {
            tracing::debug!(row = row.row_number(), "row skipped");
            row.set_skip_message(message);
            importer.skipped_rows.push(row.into_parsed());
        }
        Policy::Custom(handler) => {
            row.set_skip_message(message);
            handler(row.into_parsed(), importer);
        }
    }
}

fn handle_aborted_row(
    policy: &mut Policy<RowOutcomeHandler>,
    importer: &mut Importer,
    mut row: RowView<'_>,
    message: Option<String>,
) {
    match policy {
        Policy::Ignore => {}
        Policy::Default => {
            tracing::debug!(row = row.row_number(), "row aborted");
            row.set_abort_message(message);
            importer.aborted_rows.push(row.into_parsed());
        }
        Policy::Custom(handler) => {
            row.set_abort_message(message);
            handler(row.into_parsed(), importer);
        }
    }
}

fn handle_error(
    policy: &mut Policy<ErrorHandler>,
    importer: &mut Importer,
    error: ImportError,
    line_number: u64,
    csv_string: String,
) -> Result<(), ImportError> {
    match policy {
        // No policy: the error is fatal to the run.
        Policy::Default => Err(error),
        Policy::Ignore => {
            tracing::debug!(line = line_number, error = %error, "row errored");
            importer.error_rows.push(ErrorRow {
                error,
                line_number,
                csv_string,
            });
            Ok(())
        }
        Policy::Custom(handler) => {
            handler(&error, line_number, &csv_string, importer);
            Ok(())
        }
    }
}

/// The execution context handed to a whole-file handler.
///
/// The handler owns the run for its duration: it can walk records
/// directly, or delegate back to standard row iteration with
/// [`FileContext::import_rows`]. Either way it must leave evidence that
/// rows were imported — `import_rows` does so itself; manual iteration
/// must call [`FileContext::mark_rows_imported`].
pub struct FileContext<'r, 'a> {
    pub(crate) runner: &'r mut Runner<'a>,
}

impl FileContext<'_, '_> {
    /// The literal header cells of the input.
    pub fn headers(&self) -> &[String] {
        self.runner.source.headers()
    }

    pub fn next_record(&mut self) -> Result<Option<SourceRecord>, ImportError> {
        Ok(self.runner.source.next_record()?)
    }

    pub fn rewind(&mut self) -> Result<(), ImportError> {
        Ok(self.runner.source.rewind()?)
    }

    pub fn dependencies(&self) -> &Dependencies {
        self.runner.importer.dependencies()
    }

    pub fn importer(&mut self) -> &mut Importer {
        &mut *self.runner.importer
    }

    /// Runs standard row-by-row iteration over the remaining records.
    pub fn import_rows(&mut self) -> Result<ImportFlow, ImportError> {
        self.runner.import_rows()
    }

    /// Records the rows-imported evidence for handlers that iterate
    /// records themselves.
    pub fn mark_rows_imported(&mut self) {
        self.runner.rows_imported = true;
    }
}
