pub mod definition;
pub mod deps;
pub mod error;
pub mod headers;
pub mod importer;
pub mod parsers;
pub mod row;
pub mod runner;

pub use definition::{
    ErrorHandler, FileHandler, ImportBuilder, ImportDefinition, ImportFlow, RowFlow, RowHandler,
    RowOutcomeHandler,
};
pub use deps::Dependencies;
pub use error::ImportError;
pub use headers::{ResolvedColumn, ResolvedHeaders, resolve_headers};
pub use importer::{ErrorRow, Importer};
pub use parsers::{ParserRegistry, dispatch};
pub use row::{ParsedRow, RowView};
pub use runner::{FileContext, Runner};

pub use rowfeed_ingest::{CsvSource, IngestError, RecordSource, SourceRecord, open_csv};
pub use rowfeed_model::{
    ColumnDef, ColumnSpec, HeaderMatcher, ParseError, ParserRef, Policy, Schema, SchemaBuilder,
    SchemaError, Value,
};
