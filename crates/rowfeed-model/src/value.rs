//! Parsed cell values.

use chrono::{NaiveDate, NaiveTime};

/// A parsed column value.
///
/// Each built-in parser produces one of these variants. `Blank` is the
/// sentinel yielded when blank interception short-circuits a parser on an
/// empty or whitespace-only field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Blank-sentinel from interception; the column's parser never ran.
    Blank,
    /// The field exactly as it appeared in the input.
    Raw(String),
    /// Trimmed text.
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Value {
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Returns the textual content for `Raw` and `Text` variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Raw(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Raw(s) | Self::Text(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
        }
    }
}
