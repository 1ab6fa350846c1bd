pub mod error;
pub mod source;

pub use error::IngestError;
pub use source::{CsvSource, RecordSource, SourceRecord, open_csv};
