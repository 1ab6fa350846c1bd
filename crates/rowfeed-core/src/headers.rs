//! Header resolution: schema columns against the literal header row.

use std::collections::BTreeMap;

use rowfeed_model::Schema;

/// Where a schema column landed in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// The literal header cell that matched, or the column's own name
    /// when nothing did (diagnostics only).
    pub label: String,
    /// Field position in each record; `None` when no header matched.
    pub index: Option<usize>,
}

/// The name-to-position mapping computed once per run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHeaders {
    columns: BTreeMap<String, ResolvedColumn>,
}

impl ResolvedHeaders {
    pub fn column(&self, name: &str) -> Option<&ResolvedColumn> {
        self.columns.get(name)
    }

    /// True when the column matched a live header.
    pub fn is_present(&self, name: &str) -> bool {
        self.columns
            .get(name)
            .is_some_and(|c| c.index.is_some())
    }

    /// Required schema columns with no matching header, in declaration
    /// order.
    pub fn missing_required(&self, schema: &Schema) -> Vec<String> {
        schema
            .required_columns()
            .filter(|spec| !self.is_present(&spec.name))
            .map(|spec| spec.name.clone())
            .collect()
    }
}

/// Scans the literal headers in order for each schema column and takes the
/// first cell its matcher accepts.
pub fn resolve_headers(schema: &Schema, literal_headers: &[String]) -> ResolvedHeaders {
    let mut columns = BTreeMap::new();
    for spec in schema.columns() {
        let found = literal_headers
            .iter()
            .enumerate()
            .find(|(_, header)| spec.header.matches(header));
        let resolved = match found {
            Some((index, header)) => ResolvedColumn {
                label: header.clone(),
                index: Some(index),
            },
            None => ResolvedColumn {
                label: spec.name.clone(),
                index: None,
            },
        };
        columns.insert(spec.name.clone(), resolved);
    }
    ResolvedHeaders { columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rowfeed_model::{ColumnDef, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .column(ColumnDef::new("product"))
            .unwrap()
            .column(ColumnDef::new("unit_price"))
            .unwrap()
            .column(ColumnDef::new("discount").optional())
            .unwrap()
            .build()
            .unwrap()
    }

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_first_matching_header_wins() {
        let resolved = resolve_headers(
            &schema(),
            &headers(&["Product", "Unit Price", "product"]),
        );
        let product = resolved.column("product").unwrap();
        assert_eq!(product.label, "Product");
        assert_eq!(product.index, Some(0));
    }

    #[test]
    fn test_unmatched_column_falls_back_to_its_name() {
        let resolved = resolve_headers(&schema(), &headers(&["Product", "Unit Price"]));
        let discount = resolved.column("discount").unwrap();
        assert_eq!(discount.label, "discount");
        assert_eq!(discount.index, None);
        assert!(!resolved.is_present("discount"));
    }

    #[test]
    fn test_missing_required_excludes_optional_columns() {
        let resolved = resolve_headers(&schema(), &headers(&["Product"]));
        assert_eq!(resolved.missing_required(&schema()), ["unit_price"]);
    }

    #[test]
    fn test_nothing_missing_when_all_required_present() {
        let resolved = resolve_headers(&schema(), &headers(&["unit price", "product"]));
        assert!(resolved.missing_required(&schema()).is_empty());
    }
}
