//! Serde-friendly schema configuration.
//!
//! This is the declarative surface consumed by the CLI: a JSON document
//! describing columns and policy settings. Custom handlers and inline
//! parsers are code, so a config can only select between the default and
//! ignore policies.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::schema::{ColumnDef, SchemaBuilder};

/// Policy selection expressible in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySetting {
    #[default]
    Default,
    Ignore,
}

/// A single column declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    /// Literal header cell to match; defaults to the name-derived pattern.
    #[serde(default)]
    pub header: Option<String>,
    /// Named parser from the registry.
    #[serde(default = "default_parser")]
    pub parser: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub intercept_blanks: Option<bool>,
}

fn default_parser() -> String {
    "string".to_string()
}

fn default_required() -> bool {
    true
}

/// A complete schema configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub errors: PolicySetting,
    #[serde(default)]
    pub skipped_rows: PolicySetting,
    #[serde(default)]
    pub aborted_rows: PolicySetting,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl SchemaConfig {
    /// Translate the configuration into a [`SchemaBuilder`], applying the
    /// same fail-fast name validation as programmatic declaration.
    pub fn to_builder(&self) -> Result<SchemaBuilder, SchemaError> {
        let mut builder = SchemaBuilder::new();
        for column in &self.columns {
            let mut def = ColumnDef::new(&column.name).parser(&column.parser);
            if let Some(header) = &column.header {
                def = def.header(header);
            }
            if let Some(format) = &column.format {
                def = def.format(format);
            }
            if let Some(intercept) = column.intercept_blanks {
                def = def.intercept_blanks(intercept);
            }
            if !column.required {
                def = def.optional();
            }
            builder = builder.column(def)?;
        }
        for dependency in &self.dependencies {
            builder = builder.depends_on(dependency);
        }
        Ok(builder)
    }
}
