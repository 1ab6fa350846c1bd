//! Terminal summaries for import runs.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};

use crate::commands::{HeaderReport, ImportResult};

pub fn print_import_summary(result: &ImportResult, show_rows: bool) {
    println!("Input: {}", result.input.display());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![header_cell("Outcome"), header_cell("Rows")]);
    table.add_row(vec![
        Cell::new("Imported"),
        count_cell(result.imported.len(), Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Skipped"),
        count_cell(result.skipped.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Aborted rows"),
        count_cell(result.aborted_rows.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Errored"),
        count_cell(result.errors.len(), Color::Red),
    ]);
    println!("{table}");

    if let Some(message) = &result.abort_message {
        eprintln!("Import aborted: {message}");
    }
    if !result.errors.is_empty() {
        print_error_table(result);
    }
    if show_rows {
        print_imported_rows(result);
    }
}

fn print_error_table(result: &ImportResult) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        header_cell("Line"),
        header_cell("Record"),
        header_cell("Error"),
    ]);
    for entry in &result.errors {
        table.add_row(vec![
            Cell::new(entry.line_number).set_alignment(CellAlignment::Right),
            Cell::new(&entry.csv_string),
            Cell::new(entry.error.to_string()).fg(Color::Red),
        ]);
    }
    println!("{table}");
}

fn print_imported_rows(result: &ImportResult) {
    for row in &result.imported {
        let values: Vec<String> = row
            .values
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!("{:>4}: {}", row.row_number, values.join(", "));
    }
}

pub fn print_header_report(report: &HeaderReport) {
    println!("Input: {}", report.input.display());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Matched header"),
        header_cell("Required"),
    ]);
    for binding in &report.bindings {
        let matched = match &binding.matched {
            Some(header) => Cell::new(header),
            None => Cell::new("(none)").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&binding.column),
            matched,
            Cell::new(if binding.required { "yes" } else { "no" })
                .set_alignment(CellAlignment::Center),
        ]);
    }
    println!("{table}");

    if !report.missing.is_empty() {
        eprintln!("Missing required columns: {}", report.missing.join(", "));
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    let cell = Cell::new(count).set_alignment(CellAlignment::Right);
    if count > 0 { cell.fg(color) } else { cell }
}
