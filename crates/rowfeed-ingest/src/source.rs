//! Rewindable record sources.
//!
//! A [`RecordSource`] hands out data records one at a time after consuming
//! the header row. [`CsvSource`] is the standard implementation over any
//! `Read + Seek` input; rewinding seeks back to the first data record, so
//! a whole-file handler (or a re-run) can iterate again from the top.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::IngestError;

/// One data record from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// Field values in file order.
    pub fields: Vec<String>,
    /// 1-based line number in the underlying input, header included.
    pub line: u64,
}

impl SourceRecord {
    /// Re-serializes the record as a single CSV line, without a trailing
    /// line terminator.
    pub fn csv_string(&self) -> String {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::with_capacity(64));
        if writer.write_record(&self.fields).is_err() {
            return self.fields.join(",");
        }
        match writer.into_inner() {
            Ok(buf) => String::from_utf8_lossy(&buf)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            Err(_) => self.fields.join(","),
        }
    }
}

/// A sequential, rewindable source of records.
///
/// The header row is consumed at construction and never re-delivered as
/// data. Structurally invalid input surfaces as
/// [`IngestError::Malformed`].
pub trait RecordSource {
    /// The literal header cells from row 0 of the input.
    fn headers(&self) -> &[String];

    /// The next data record, or `None` once the input is exhausted.
    fn next_record(&mut self) -> Result<Option<SourceRecord>, IngestError>;

    /// Repositions the source at the first data record.
    fn rewind(&mut self) -> Result<(), IngestError>;
}

/// CSV-backed record source.
#[derive(Debug)]
pub struct CsvSource<R: Read + Seek> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    data_start: csv::Position,
    record: csv::StringRecord,
}

impl<R: Read + Seek> CsvSource<R> {
    /// Reads the header row eagerly and positions the source at the first
    /// data record.
    pub fn from_reader(input: R) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(IngestError::MissingHeaderRow);
        }
        let data_start = reader.position().clone();
        Ok(Self {
            reader,
            headers,
            data_start,
            record: csv::StringRecord::new(),
        })
    }
}

impl CsvSource<Cursor<String>> {
    /// In-memory source, mostly for tests and small inputs.
    pub fn from_string(input: impl Into<String>) -> Result<Self, IngestError> {
        Self::from_reader(Cursor::new(input.into()))
    }
}

/// Opens a CSV file as a record source.
pub fn open_csv(path: impl AsRef<Path>) -> Result<CsvSource<File>, IngestError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening csv source");
    let file = File::open(path)?;
    CsvSource::from_reader(file)
}

impl<R: Read + Seek> RecordSource for CsvSource<R> {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_record(&mut self) -> Result<Option<SourceRecord>, IngestError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        let line = self.record.position().map_or(0, csv::Position::line);
        let fields = self.record.iter().map(str::to_string).collect();
        Ok(Some(SourceRecord { fields, line }))
    }

    fn rewind(&mut self) -> Result<(), IngestError> {
        self.reader.seek(self.data_start.clone())?;
        Ok(())
    }
}
