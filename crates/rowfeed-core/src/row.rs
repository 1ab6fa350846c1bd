//! Per-row accessors.
//!
//! A [`RowView`] is built at the top of each iteration and handed to the
//! row handler. Column values parse lazily on first access and are cached
//! for the rest of the row's lifetime. Publishing a row into an outcome
//! collection converts it to an owned [`ParsedRow`] snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use rowfeed_ingest::SourceRecord;
use rowfeed_model::{ColumnSpec, ParserFn, Schema, Value};

use crate::error::ImportError;
use crate::headers::ResolvedHeaders;
use crate::parsers;

/// Read access to one input row, with lazy parse-and-cache of declared
/// columns.
pub struct RowView<'a> {
    record: SourceRecord,
    row_number: u64,
    csv_string: String,
    schema: &'a Schema,
    headers: &'a ResolvedHeaders,
    parsers: &'a BTreeMap<String, Arc<ParserFn>>,
    cache: BTreeMap<String, Value>,
    skip_message: Option<String>,
    abort_message: Option<String>,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(
        record: SourceRecord,
        row_number: u64,
        schema: &'a Schema,
        headers: &'a ResolvedHeaders,
        parsers: &'a BTreeMap<String, Arc<ParserFn>>,
    ) -> Self {
        let csv_string = record.csv_string();
        Self {
            record,
            row_number,
            csv_string,
            schema,
            headers,
            parsers,
            cache: BTreeMap::new(),
            skip_message: None,
            abort_message: None,
        }
    }

    /// 1-based over data rows; the header row is not counted.
    pub fn row_number(&self) -> u64 {
        self.row_number
    }

    /// 1-based line in the underlying input, header included.
    pub fn line_number(&self) -> u64 {
        self.record.line
    }

    /// The raw record as read from the source.
    pub fn unparsed(&self) -> &SourceRecord {
        &self.record
    }

    /// The row re-serialized as a single CSV line.
    pub fn csv_string(&self) -> &str {
        &self.csv_string
    }

    /// The raw field for a declared column, before parsing. Empty when
    /// the column's header did not match anything in the input.
    pub fn raw(&self, name: &str) -> Result<&str, ImportError> {
        let spec = self
            .schema
            .column(name)
            .ok_or_else(|| ImportError::UnknownColumn(name.to_string()))?;
        Ok(self.raw_field(spec))
    }

    /// The parsed value for a declared column, parsing it on first access.
    pub fn value(&mut self, name: &str) -> Result<&Value, ImportError> {
        if !self.cache.contains_key(name) {
            let parsed = self.parse_column(name)?;
            self.cache.insert(name.to_string(), parsed);
        }
        self.cache
            .get(name)
            .ok_or_else(|| ImportError::UnknownColumn(name.to_string()))
    }

    /// An owned copy of the row's current state, cached values included.
    pub fn snapshot(&self) -> ParsedRow {
        ParsedRow {
            row_number: self.row_number,
            line_number: self.record.line,
            fields: self.record.fields.clone(),
            csv_string: self.csv_string.clone(),
            values: self.cache.clone(),
            skip_message: self.skip_message.clone(),
            abort_message: self.abort_message.clone(),
        }
    }

    pub(crate) fn set_skip_message(&mut self, message: Option<String>) {
        self.skip_message = message;
    }

    pub(crate) fn set_abort_message(&mut self, message: Option<String>) {
        self.abort_message = message;
    }

    pub(crate) fn into_parsed(self) -> ParsedRow {
        ParsedRow {
            row_number: self.row_number,
            line_number: self.record.line,
            fields: self.record.fields,
            csv_string: self.csv_string,
            values: self.cache,
            skip_message: self.skip_message,
            abort_message: self.abort_message,
        }
    }

    fn parse_column(&self, name: &str) -> Result<Value, ImportError> {
        let spec = self
            .schema
            .column(name)
            .ok_or_else(|| ImportError::UnknownColumn(name.to_string()))?;
        let parser = self
            .parsers
            .get(name)
            .ok_or_else(|| ImportError::UnknownColumn(name.to_string()))?;
        let raw = self.raw_field(spec);
        parsers::dispatch(spec, parser.as_ref(), raw).map_err(|err| ImportError::Parse {
            column: name.to_string(),
            row_number: self.row_number,
            message: err.0,
        })
    }

    fn raw_field(&self, spec: &ColumnSpec) -> &str {
        self.headers
            .column(&spec.name)
            .and_then(|resolved| resolved.index)
            .and_then(|index| self.record.fields.get(index))
            .map_or("", String::as_str)
    }
}

/// The owned snapshot of a row published to an outcome collection or a
/// custom handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub row_number: u64,
    pub line_number: u64,
    pub fields: Vec<String>,
    pub csv_string: String,
    pub values: BTreeMap<String, Value>,
    pub skip_message: Option<String>,
    pub abort_message: Option<String>,
}

impl ParsedRow {
    /// A cached column value, if the row handler accessed it.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}
