//! Column declarations and the compiled import schema.
//!
//! A [`SchemaBuilder`] accumulates [`ColumnDef`] declarations and fails
//! fast on duplicate or reserved names. [`Schema::build`] compiles each
//! declaration into a [`ColumnSpec`] with a concrete header matcher, after
//! which the schema is immutable.

use std::sync::Arc;

use regex::Regex;

use crate::error::{ParseError, SchemaError};
use crate::value::Value;

/// Row-metadata field names that can never be used as column names.
pub const RESERVED_COLUMN_NAMES: [&str; 5] = [
    "unparsed",
    "csv_string",
    "row_number",
    "skip_message",
    "abort_message",
];

/// Signature shared by all column parsers: raw field text plus the
/// column's optional format hint.
pub type ParserFn = dyn Fn(&str, Option<&str>) -> Result<Value, ParseError> + Send + Sync;

/// Reference to the parser a column uses.
#[derive(Clone)]
pub enum ParserRef {
    /// Resolved by name against the combined parser registry
    /// (built-ins plus importer-supplied parsers).
    Named(String),
    /// An inline per-column parser.
    Inline(Arc<ParserFn>),
}

impl ParserRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn inline<F>(parser: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        Self::Inline(Arc::new(parser))
    }
}

impl std::fmt::Debug for ParserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "Named({name:?})"),
            Self::Inline(_) => write!(f, "Inline(..)"),
        }
    }
}

/// Matches a schema column against literal header cells.
#[derive(Debug, Clone)]
pub enum HeaderMatcher {
    /// Case-insensitive, whitespace-trimmed literal comparison.
    Literal(String),
    /// Arbitrary pattern match against the raw header cell.
    Pattern(Regex),
}

impl HeaderMatcher {
    /// The default matcher for a column name: case-insensitive, ignores
    /// surrounding whitespace, treats underscores and spaces in the name
    /// as interchangeable, and must match the whole cell.
    pub fn for_column(name: &str) -> Result<Self, SchemaError> {
        let escaped = regex::escape(name);
        let spaced = regex::escape(&name.replace('_', " "));
        let pattern = format!(r"(?i)^\s*(?:{escaped}|{spaced})\s*$");
        let regex = Regex::new(&pattern).map_err(|source| SchemaError::InvalidHeaderPattern {
            column: name.to_string(),
            source,
        })?;
        Ok(Self::Pattern(regex))
    }

    pub fn matches(&self, header: &str) -> bool {
        match self {
            Self::Literal(expected) => expected.trim().eq_ignore_ascii_case(header.trim()),
            Self::Pattern(regex) => regex.is_match(header),
        }
    }
}

/// A column declaration, accumulated by [`SchemaBuilder`].
///
/// Unset options take their defaults when the schema is built: the header
/// matcher derives from the column name, the parser is `string`, and blank
/// interception is on for everything except the `raw` parser.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: String,
    header: Option<HeaderMatcher>,
    parser: ParserRef,
    format: Option<String>,
    intercept_blanks: Option<bool>,
    required: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: None,
            parser: ParserRef::named("string"),
            format: None,
            intercept_blanks: None,
            required: true,
        }
    }

    /// Match the header against a literal cell value instead of the
    /// default name-derived pattern.
    #[must_use]
    pub fn header(mut self, literal: impl Into<String>) -> Self {
        self.header = Some(HeaderMatcher::Literal(literal.into()));
        self
    }

    /// Match the header against an arbitrary pattern.
    #[must_use]
    pub fn header_pattern(mut self, pattern: Regex) -> Self {
        self.header = Some(HeaderMatcher::Pattern(pattern));
        self
    }

    /// Parse with a named parser from the registry.
    #[must_use]
    pub fn parser(mut self, name: impl Into<String>) -> Self {
        self.parser = ParserRef::named(name);
        self
    }

    /// Parse with an inline closure.
    #[must_use]
    pub fn parse_with<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        self.parser = ParserRef::inline(parser);
        self
    }

    /// Format hint passed through to the parser (e.g. a strftime string
    /// for the `date` parser).
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Override blank interception for this column.
    #[must_use]
    pub fn intercept_blanks(mut self, enabled: bool) -> Self {
        self.intercept_blanks = Some(enabled);
        self
    }

    /// Mark the column optional: a missing header is not an error, the
    /// column simply never produces data.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn build(self) -> Result<ColumnSpec, SchemaError> {
        let header = match self.header {
            Some(matcher) => matcher,
            None => HeaderMatcher::for_column(&self.name)?,
        };
        // The raw parser sees blank fields verbatim; every other parser
        // is shielded from them unless the column says otherwise.
        let intercept_blanks = self
            .intercept_blanks
            .unwrap_or(!matches!(&self.parser, ParserRef::Named(name) if name == "raw"));
        Ok(ColumnSpec {
            name: self.name,
            header,
            parser: self.parser,
            format: self.format,
            intercept_blanks,
            required: self.required,
        })
    }
}

/// A fully-resolved column, immutable once the schema is built.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub header: HeaderMatcher,
    pub parser: ParserRef,
    pub format: Option<String>,
    pub intercept_blanks: bool,
    pub required: bool,
}

/// Accumulates column declarations and dependency names.
///
/// Name collisions fail at declaration time, not at run time.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<ColumnDef>,
    dependencies: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column. Rejects duplicate and reserved names immediately.
    pub fn column(mut self, def: ColumnDef) -> Result<Self, SchemaError> {
        if self.columns.iter().any(|c| c.name == def.name) {
            return Err(SchemaError::DuplicateColumn(def.name));
        }
        if RESERVED_COLUMN_NAMES.contains(&def.name.as_str()) {
            return Err(SchemaError::ReservedColumnName {
                name: def.name,
                reserved: &RESERVED_COLUMN_NAMES,
            });
        }
        self.columns.push(def);
        Ok(self)
    }

    /// Declare a named dependency that must be bound on the importer
    /// before any handler executes.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.dependencies.contains(&name) {
            self.dependencies.push(name);
        }
        self
    }

    /// Compile the accumulated declarations into an immutable [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        let columns = self
            .columns
            .into_iter()
            .map(ColumnDef::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Schema {
            columns,
            dependencies: self.dependencies,
        })
    }
}

/// The compiled, immutable description of an import's columns and
/// dependencies. Produced once, before any row is processed.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
    dependencies: Vec<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.required)
    }

    /// Declared dependency names, in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with(names: &[&str]) -> Result<Schema, SchemaError> {
        let mut builder = SchemaBuilder::new();
        for name in names {
            builder = builder.column(ColumnDef::new(*name))?;
        }
        builder.build()
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = schema_with(&["price", "price"]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn(name) if name == "price"));
    }

    #[test]
    fn test_reserved_names_rejected() {
        for reserved in RESERVED_COLUMN_NAMES {
            let err = schema_with(&[reserved]).unwrap_err();
            assert!(matches!(err, SchemaError::ReservedColumnName { name, .. } if name == reserved));
        }
    }

    #[test]
    fn test_default_matcher_accepts_name_variants() {
        let matcher = HeaderMatcher::for_column("unit_price").unwrap();
        assert!(matcher.matches("unit_price"));
        assert!(matcher.matches("unit price"));
        assert!(matcher.matches("Unit Price"));
        assert!(matcher.matches("  UNIT_PRICE  "));
    }

    #[test]
    fn test_default_matcher_is_anchored() {
        let matcher = HeaderMatcher::for_column("price").unwrap();
        assert!(!matcher.matches("unit price"));
        assert!(!matcher.matches("price per unit"));
        assert!(!matcher.matches("priced"));
    }

    #[test]
    fn test_default_matcher_escapes_metacharacters() {
        let matcher = HeaderMatcher::for_column("cost_(usd)").unwrap();
        assert!(matcher.matches("cost (usd)"));
        assert!(!matcher.matches("cost_Xusd)"));
    }

    #[test]
    fn test_literal_header_matcher() {
        let matcher = HeaderMatcher::Literal("Unit Price".to_string());
        assert!(matcher.matches(" unit price "));
        assert!(!matcher.matches("unit"));
    }

    #[test]
    fn test_intercept_blanks_defaults() {
        let schema = SchemaBuilder::new()
            .column(ColumnDef::new("name"))
            .unwrap()
            .column(ColumnDef::new("notes").parser("raw"))
            .unwrap()
            .column(ColumnDef::new("memo").parser("raw").intercept_blanks(true))
            .unwrap()
            .build()
            .unwrap();
        assert!(schema.column("name").unwrap().intercept_blanks);
        assert!(!schema.column("notes").unwrap().intercept_blanks);
        assert!(schema.column("memo").unwrap().intercept_blanks);
    }

    #[test]
    fn test_dependencies_deduplicated_in_order() {
        let schema = SchemaBuilder::new()
            .depends_on("product_store")
            .depends_on("audit_log")
            .depends_on("product_store")
            .build()
            .unwrap();
        assert_eq!(schema.dependencies(), ["product_store", "audit_log"]);
    }

    #[test]
    fn test_columns_keep_declaration_order() {
        let schema = schema_with(&["b", "a", "c"]).unwrap();
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }
}
