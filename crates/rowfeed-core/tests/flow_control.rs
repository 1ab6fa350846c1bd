//! Runner flow-control behavior: preconditions, per-row classification,
//! abort propagation, and delegated file mode.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rowfeed_core::{
    ColumnDef, CsvSource, ImportBuilder, ImportError, ImportFlow, Importer, ParsedRow, RowFlow,
    Runner, Value,
};

const PRODUCTS: &str = "Product,Unit Price,Quantity\n\
                        widget,10.00,4\n\
                        gadget,3.25,12\n\
                        doohickey,0.50,40\n";

fn product_columns() -> ImportBuilder {
    ImportBuilder::new()
        .column(ColumnDef::new("product"))
        .unwrap()
        .column(ColumnDef::new("unit_price").parser("decimal"))
        .unwrap()
        .column(ColumnDef::new("quantity").parser("integer"))
        .unwrap()
}

type Collected = Rc<RefCell<Vec<ParsedRow>>>;

fn collecting_rows() -> (Collected, impl FnMut(&mut rowfeed_core::RowView<'_>, &rowfeed_core::Dependencies) -> Result<RowFlow, ImportError>)
{
    let imported: Collected = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&imported);
    let handler = move |row: &mut rowfeed_core::RowView<'_>,
                        _deps: &rowfeed_core::Dependencies|
          -> Result<RowFlow, ImportError> {
        row.value("product")?;
        row.value("unit_price")?;
        row.value("quantity")?;
        sink.borrow_mut().push(row.snapshot());
        Ok(RowFlow::Continue)
    };
    (imported, handler)
}

#[test]
fn test_all_rows_import() {
    let (imported, handler) = collecting_rows();
    let definition = product_columns().rows(handler).build().unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let completed = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap();

    assert!(completed);
    assert!(!importer.aborted);
    let imported = imported.borrow();
    assert_eq!(imported.len(), 3);
    assert_eq!(imported[0].value("product"), Some(&Value::Text("widget".into())));
    assert_eq!(imported[0].value("unit_price"), Some(&Value::Decimal(10.0)));
    assert_eq!(imported[0].row_number, 1);
    assert_eq!(imported[2].row_number, 3);
}

#[test]
fn test_aborted_import_stops_after_current_row() {
    let imported: Collected = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&imported);
    let definition = product_columns()
        .rows(move |row, _deps| {
            if row.row_number() == 2 {
                return Ok(RowFlow::AbortImport("stop".to_string()));
            }
            sink.borrow_mut().push(row.snapshot());
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let completed = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap();

    assert!(!completed);
    assert!(importer.aborted);
    assert_eq!(importer.abort_message.as_deref(), Some("stop"));
    // Row 1 stays imported; row 3 is never read.
    assert_eq!(imported.borrow().len(), 1);
    assert_eq!(
        imported.borrow()[0].value("product"),
        Some(&Value::Text("widget".into()))
    );
}

#[test]
fn test_skipped_rows_collect_with_message() {
    let definition = product_columns()
        .rows(|row, _deps| {
            if row.value("quantity")?.as_integer() == Some(12) {
                return Ok(RowFlow::Skip(Some("out of stock".to_string())));
            }
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let completed = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap();

    assert!(completed);
    assert_eq!(importer.skipped_rows.len(), 1);
    let skipped = &importer.skipped_rows[0];
    assert_eq!(skipped.skip_message.as_deref(), Some("out of stock"));
    assert_eq!(skipped.row_number, 2);
}

#[test]
fn test_ignore_policy_drops_skipped_rows() {
    let definition = product_columns()
        .rows(|_row, _deps| Ok(RowFlow::Skip(None)))
        .ignore_skipped_rows()
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert!(importer.skipped_rows.is_empty());
}

#[test]
fn test_custom_skip_handler_owns_disposition() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let definition = product_columns()
        .rows(|row, _deps| Ok(RowFlow::Skip(Some(format!("row {}", row.row_number())))))
        .on_skipped_rows(move |row, _importer| {
            sink.borrow_mut().push(row.skip_message.unwrap_or_default());
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    // Custom handler ran instead of the default collection.
    assert!(importer.skipped_rows.is_empty());
    assert_eq!(seen.borrow().as_slice(), ["row 1", "row 2", "row 3"]);
}

#[test]
fn test_aborted_rows_collect_with_message() {
    let definition = product_columns()
        .rows(|row, _deps| {
            if row.row_number() == 1 {
                Ok(RowFlow::AbortRow(Some("bad lot".to_string())))
            } else {
                Ok(RowFlow::Continue)
            }
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    // Abort-row affects only its row; the run still completes.
    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert_eq!(importer.aborted_rows.len(), 1);
    assert_eq!(
        importer.aborted_rows[0].abort_message.as_deref(),
        Some("bad lot")
    );
    assert!(!importer.aborted);
}

#[test]
fn test_next_abandons_row_without_outcome() {
    let counter = Rc::new(RefCell::new(0u32));
    let seen = Rc::clone(&counter);
    let definition = product_columns()
        .rows(move |_row, _deps| {
            *seen.borrow_mut() += 1;
            Ok(RowFlow::Next)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert_eq!(*counter.borrow(), 3);
    assert!(importer.skipped_rows.is_empty());
    assert!(importer.aborted_rows.is_empty());
    assert!(importer.error_rows.is_empty());
}

#[test]
fn test_row_errors_propagate_without_policy() {
    let definition = product_columns()
        .rows(|_row, _deps| Err(ImportError::other("boom")))
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let err = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap_err();
    assert!(matches!(err, ImportError::Other(_)));
}

#[test]
fn test_ignore_policy_still_collects_errors() {
    let definition = product_columns()
        .rows(|row, _deps| {
            if row.row_number() == 2 {
                return Err(ImportError::other("boom"));
            }
            Ok(RowFlow::Continue)
        })
        .ignore_errors()
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert_eq!(importer.error_rows.len(), 1);
    let entry = &importer.error_rows[0];
    // gadget is on file line 3 (line 1 is the header).
    assert_eq!(entry.line_number, 3);
    assert_eq!(entry.csv_string, "gadget,3.25,12");
}

#[test]
fn test_custom_error_handler_sees_the_triple() {
    let seen: Rc<RefCell<Vec<(u64, String, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let definition = product_columns()
        .rows(|row, _deps| {
            if row.row_number() == 1 {
                return Err(ImportError::other("bad widget"));
            }
            Ok(RowFlow::Continue)
        })
        .on_errors(move |error, line_number, csv_string, _importer| {
            sink.borrow_mut()
                .push((line_number, csv_string.to_string(), error.to_string()));
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert!(importer.error_rows.is_empty());
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 2);
    assert_eq!(seen[0].1, "widget,10.00,4");
    assert_eq!(seen[0].2, "bad widget");
}

#[test]
fn test_parse_failures_follow_error_policy() {
    let definition = product_columns()
        .rows(|row, _deps| {
            row.value("quantity")?;
            Ok(RowFlow::Continue)
        })
        .ignore_errors()
        .build()
        .unwrap();
    let input = "Product,Unit Price,Quantity\nwidget,10.00,many\ngadget,3.25,12\n";
    let mut source = CsvSource::from_string(input).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert_eq!(importer.error_rows.len(), 1);
    assert!(matches!(
        importer.error_rows[0].error,
        ImportError::Parse { ref column, row_number, .. } if column == "quantity" && row_number == 1
    ));
}

#[test]
fn test_missing_required_column_fails_before_any_row() {
    let calls = Rc::new(RefCell::new(0u32));
    let seen = Rc::clone(&calls);
    let definition = product_columns()
        .rows(move |_row, _deps| {
            *seen.borrow_mut() += 1;
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string("Product,Quantity\nwidget,4\n").unwrap();
    let mut importer = Importer::new();

    let err = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap_err();
    assert!(matches!(err, ImportError::MissingColumns(ref cols) if cols == &["unit_price"]));
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_optional_column_absent_yields_blank() {
    let definition = ImportBuilder::new()
        .column(ColumnDef::new("product"))
        .unwrap()
        .column(ColumnDef::new("discount").parser("decimal").optional())
        .unwrap()
        .rows(|row, _deps| {
            assert!(row.value("discount")?.is_blank());
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string("Product\nwidget\n").unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
}

#[test]
fn test_unknown_named_parser_fails_the_run() {
    let definition = ImportBuilder::new()
        .column(ColumnDef::new("product").parser("fancy"))
        .unwrap()
        .rows(|_row, _deps| Ok(RowFlow::Continue))
        .build()
        .unwrap();
    let mut source = CsvSource::from_string("Product\nwidget\n").unwrap();
    let mut importer = Importer::new();

    let err = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::UnknownParser { ref parser, ref column } if parser == "fancy" && column == "product"
    ));
}

#[test]
fn test_importer_registered_parser_resolves() {
    let definition = ImportBuilder::new()
        .column(ColumnDef::new("product").parser("upcase"))
        .unwrap()
        .rows(|row, _deps| {
            assert_eq!(row.value("product")?, &Value::Text("WIDGET".into()));
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string("Product\nwidget\n").unwrap();
    let mut importer = Importer::new();
    importer.register_parser("upcase", |value, _format| {
        Ok(Value::Text(value.trim().to_uppercase()))
    });

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
}

#[test]
fn test_unbound_dependency_fails_the_run() {
    let definition = product_columns()
        .depends_on("product_store")
        .rows(|_row, _deps| Ok(RowFlow::Continue))
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let err = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap_err();
    assert!(matches!(err, ImportError::MissingDependencies(ref deps) if deps == &["product_store"]));
}

#[test]
fn test_bound_dependency_reaches_the_handler() {
    let definition = product_columns()
        .depends_on("price_floor")
        .rows(|row, deps| {
            let floor = deps
                .get::<f64>("price_floor")
                .ok_or_else(|| ImportError::other("price_floor unbound"))?;
            if row.value("unit_price")?.as_decimal() < Some(*floor) {
                return Ok(RowFlow::Skip(Some("below floor".to_string())));
            }
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();
    importer.bind("price_floor", 1.0f64);

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    // Only doohickey (0.50) is below the floor.
    assert_eq!(importer.skipped_rows.len(), 1);
    assert_eq!(importer.skipped_rows[0].row_number, 3);
}

#[test]
fn test_missing_handler_is_a_configuration_error() {
    let definition = product_columns().build().unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let err = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap_err();
    assert!(matches!(err, ImportError::MissingRowHandler));
}

#[test]
fn test_file_mode_delegates_to_handler() {
    let (imported, row_handler) = collecting_rows();
    let definition = product_columns()
        .rows(row_handler)
        .file(|ctx| ctx.import_rows())
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert_eq!(imported.borrow().len(), 3);
}

#[test]
fn test_file_mode_manual_iteration_with_evidence() {
    let counted = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&counted);
    let definition = product_columns()
        .file(move |ctx| {
            while ctx.next_record()?.is_some() {
                *sink.borrow_mut() += 1;
            }
            ctx.mark_rows_imported();
            Ok(ImportFlow::Completed)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    assert_eq!(*counted.borrow(), 3);
}

#[test]
fn test_file_mode_without_importing_rows_is_fatal() {
    let definition = product_columns()
        .file(|_ctx| Ok(ImportFlow::Completed))
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let err = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap_err();
    assert!(matches!(err, ImportError::RowsNotImported));
}

#[test]
fn test_file_mode_abort_reports_like_row_mode() {
    let definition = product_columns()
        .file(|_ctx| Ok(ImportFlow::Abort("file said no".to_string())))
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();

    let completed = Runner::new(&mut source, definition, &mut importer)
        .run()
        .unwrap();
    assert!(!completed);
    assert!(importer.aborted);
    assert_eq!(importer.abort_message.as_deref(), Some("file said no"));
}

#[test]
fn test_rerun_with_cleared_outcomes_is_identical() {
    let definition = product_columns()
        .rows(|row, _deps| {
            if row.row_number() == 2 {
                return Ok(RowFlow::Skip(Some("dupe".to_string())));
            }
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string(PRODUCTS).unwrap();
    let mut importer = Importer::new();
    let mut runner = Runner::new(&mut source, definition, &mut importer);

    assert!(runner.run().unwrap());
    let first: Vec<ParsedRow> = runner.importer().skipped_rows.clone();

    // Same runner instance, rewound source, fresh collections.
    runner.importer_mut().clear_outcomes();
    assert!(runner.run().unwrap());
    assert_eq!(runner.importer().skipped_rows, first);
}

#[test]
fn test_values_parse_once_per_row() {
    let parses = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&parses);
    let definition = ImportBuilder::new()
        .column(ColumnDef::new("quantity").parse_with(move |value, _format| {
            counter.fetch_add(1, Ordering::Relaxed);
            value
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| rowfeed_core::ParseError::new("not an integer"))
        }))
        .unwrap()
        .rows(|row, _deps| {
            row.value("quantity")?;
            row.value("quantity")?;
            Ok(RowFlow::Continue)
        })
        .build()
        .unwrap();
    let mut source = CsvSource::from_string("Quantity\n4\n12\n").unwrap();
    let mut importer = Importer::new();

    assert!(Runner::new(&mut source, definition, &mut importer).run().unwrap());
    // Two rows, each parsed exactly once despite double access.
    assert_eq!(parses.load(Ordering::Relaxed), 2);
}
