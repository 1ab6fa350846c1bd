//! Built-in value parsers and the named-parser registry.
//!
//! Columns reference parsers either inline or by name. Named references
//! resolve against a [`ParserRegistry`] combining the built-ins below with
//! any parsers the importer registers. Resolution happens during the
//! runner's precondition checks, so an unknown name fails the run before
//! any row is read.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use rowfeed_model::{ColumnSpec, ParseError, ParserFn, ParserRef, Value};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

pub fn parse_raw(value: &str, _format: Option<&str>) -> Result<Value, ParseError> {
    Ok(Value::Raw(value.to_string()))
}

pub fn parse_string(value: &str, _format: Option<&str>) -> Result<Value, ParseError> {
    Ok(Value::Text(value.trim().to_string()))
}

pub fn parse_integer(value: &str, _format: Option<&str>) -> Result<Value, ParseError> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| ParseError::new(format!("'{trimmed}' is not an integer")))
}

/// Parses a decimal, stripping currency symbols and digit separators
/// first so values like `$1,234.50` come through.
pub fn parse_decimal(value: &str, _format: Option<&str>) -> Result<Value, ParseError> {
    let cleaned: String = value
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();
    cleaned
        .parse::<f64>()
        .map(Value::Decimal)
        .map_err(|_| ParseError::new(format!("'{}' is not a decimal", value.trim())))
}

pub fn parse_boolean(value: &str, _format: Option<&str>) -> Result<Value, ParseError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "t" | "true" | "y" | "yes" => Ok(Value::Boolean(true)),
        "0" | "f" | "false" | "n" | "no" => Ok(Value::Boolean(false)),
        _ => Err(ParseError::new(format!("'{normalized}' is not a boolean"))),
    }
}

/// Parses a date with the column's strftime format hint, ISO 8601 when
/// none is given.
pub fn parse_date(value: &str, format: Option<&str>) -> Result<Value, ParseError> {
    let format = format.unwrap_or(DEFAULT_DATE_FORMAT);
    NaiveDate::parse_from_str(value.trim(), format)
        .map(Value::Date)
        .map_err(|err| ParseError::new(format!("'{}' is not a date ({err})", value.trim())))
}

pub fn parse_time(value: &str, format: Option<&str>) -> Result<Value, ParseError> {
    let format = format.unwrap_or(DEFAULT_TIME_FORMAT);
    NaiveTime::parse_from_str(value.trim(), format)
        .map(Value::Time)
        .map_err(|err| ParseError::new(format!("'{}' is not a time ({err})", value.trim())))
}

/// Named parsers available to column declarations.
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<ParserFn>>,
}

impl ParserRegistry {
    /// An empty registry with no parsers at all.
    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// The standard registry: `raw`, `string`, `integer`, `decimal`,
    /// `boolean`, `date`, and `time`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("raw", parse_raw);
        registry.register("string", parse_string);
        registry.register("integer", parse_integer);
        registry.register("decimal", parse_decimal);
        registry.register("boolean", parse_boolean);
        registry.register("date", parse_date);
        registry.register("time", parse_time);
        registry
    }

    /// Registers a named parser, replacing any existing one of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&str, Option<&str>) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        self.parsers.insert(name.into(), Arc::new(parser));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ParserFn>> {
        self.parsers.get(name).cloned()
    }

    /// Resolves a column's parser reference to a callable.
    pub fn resolve(&self, parser: &ParserRef) -> Option<Arc<ParserFn>> {
        match parser {
            ParserRef::Named(name) => self.get(name),
            ParserRef::Inline(f) => Some(Arc::clone(f)),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Applies a resolved parser to a raw field.
///
/// When the column intercepts blanks and the field is empty or
/// whitespace-only, yields [`Value::Blank`] without invoking the parser.
pub fn dispatch(spec: &ColumnSpec, parser: &ParserFn, raw: &str) -> Result<Value, ParseError> {
    if spec.intercept_blanks && raw.trim().is_empty() {
        return Ok(Value::Blank);
    }
    parser(raw, spec.format.as_deref())
}
