pub mod config;
pub mod error;
pub mod policy;
pub mod schema;
pub mod value;

pub use config::{ColumnConfig, PolicySetting, SchemaConfig};
pub use error::{ParseError, SchemaError};
pub use policy::Policy;
pub use schema::{
    ColumnDef, ColumnSpec, HeaderMatcher, ParserFn, ParserRef, RESERVED_COLUMN_NAMES, Schema,
    SchemaBuilder,
};
pub use value::Value;
