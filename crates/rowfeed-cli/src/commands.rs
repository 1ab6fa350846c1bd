//! Command implementations.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};

use rowfeed_core::{
    ErrorRow, ImportBuilder, Importer, ParsedRow, ResolvedHeaders, RowFlow, Runner,
    resolve_headers,
};
use rowfeed_ingest::{RecordSource, open_csv};
use rowfeed_model::{PolicySetting, Schema, SchemaConfig};

use crate::cli::{HeadersArgs, ImportArgs};

/// Outcome of an `import` run, ready for summary printing.
pub struct ImportResult {
    pub input: PathBuf,
    pub completed: bool,
    pub imported: Vec<ParsedRow>,
    pub skipped: Vec<ParsedRow>,
    pub aborted_rows: Vec<ParsedRow>,
    pub errors: Vec<ErrorRow>,
    pub abort_message: Option<String>,
}

impl ImportResult {
    pub fn has_failures(&self) -> bool {
        !self.completed || !self.errors.is_empty()
    }
}

pub fn run_import(args: &ImportArgs) -> Result<ImportResult> {
    let config = load_schema_config(&args.schema)?;
    let column_names: Vec<String> = config.columns.iter().map(|c| c.name.clone()).collect();

    let imported: Rc<RefCell<Vec<ParsedRow>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&imported);

    let mut builder = ImportBuilder::from_schema(
        config
            .to_builder()
            .with_context(|| format!("invalid schema: {}", args.schema.display()))?,
    )
    .rows(move |row, _deps| {
        // Parse every declared column so the snapshot is fully populated.
        for name in &column_names {
            row.value(name)?;
        }
        sink.borrow_mut().push(row.snapshot());
        Ok(RowFlow::Continue)
    });
    if config.errors == PolicySetting::Ignore {
        builder = builder.ignore_errors();
    }
    if config.skipped_rows == PolicySetting::Ignore {
        builder = builder.ignore_skipped_rows();
    }
    if config.aborted_rows == PolicySetting::Ignore {
        builder = builder.ignore_aborted_rows();
    }
    let definition = builder
        .build()
        .with_context(|| format!("invalid schema: {}", args.schema.display()))?;

    let mut source = open_csv(&args.input)
        .with_context(|| format!("failed to open input: {}", args.input.display()))?;
    let mut importer = Importer::new();
    let completed = Runner::new(&mut source, definition, &mut importer)
        .run()
        .with_context(|| format!("import failed: {}", args.input.display()))?;

    Ok(ImportResult {
        input: args.input.clone(),
        completed,
        imported: imported.take(),
        skipped: importer.skipped_rows,
        aborted_rows: importer.aborted_rows,
        errors: importer.error_rows,
        abort_message: importer.abort_message,
    })
}

/// Header resolution for one column, for reporting.
pub struct HeaderBinding {
    pub column: String,
    pub matched: Option<String>,
    pub required: bool,
}

/// Outcome of a `headers` run.
pub struct HeaderReport {
    pub input: PathBuf,
    pub bindings: Vec<HeaderBinding>,
    pub missing: Vec<String>,
}

pub fn run_headers(args: &HeadersArgs) -> Result<HeaderReport> {
    let config = load_schema_config(&args.schema)?;
    let schema = config
        .to_builder()
        .and_then(|b| b.build())
        .with_context(|| format!("invalid schema: {}", args.schema.display()))?;

    let source = open_csv(&args.input)
        .with_context(|| format!("failed to open input: {}", args.input.display()))?;
    let resolved = resolve_headers(&schema, source.headers());

    Ok(HeaderReport {
        input: args.input.clone(),
        bindings: bindings_for(&schema, &resolved),
        missing: resolved.missing_required(&schema),
    })
}

fn bindings_for(schema: &Schema, resolved: &ResolvedHeaders) -> Vec<HeaderBinding> {
    schema
        .columns()
        .iter()
        .map(|spec| {
            let matched = resolved
                .column(&spec.name)
                .filter(|c| c.index.is_some())
                .map(|c| c.label.clone());
            HeaderBinding {
                column: spec.name.clone(),
                matched,
                required: spec.required,
            }
        })
        .collect()
}

fn load_schema_config(path: &Path) -> Result<SchemaConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema config: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse schema config: {}", path.display()))
}
