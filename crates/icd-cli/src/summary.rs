//! Human readable run summary.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::ValidateOutcome;

/// How many rejection reasons are printed per file before eliding.
const MAX_PRINTED_ISSUES: usize = 25;

pub fn print_summary(outcome: &ValidateOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Data file"),
        header_cell("Accepted"),
        header_cell("Rejected"),
        header_cell("End checks passed"),
        header_cell("End checks failed"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for column in table.column_iter_mut().skip(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    for file in &outcome.files {
        let totals = file.totals;
        table.add_row(vec![
            Cell::new(file.path.display()),
            Cell::new(totals.accepted_rows),
            count_cell(totals.rejected_rows, Color::Red),
            Cell::new(totals.passed_checks_at_end),
            count_cell(totals.failed_checks_at_end, Color::Red),
        ]);
    }
    println!("{table}");

    for file in &outcome.files {
        if file.row_issues.is_empty() && file.end_check_failures.is_empty() {
            continue;
        }
        println!("{}:", file.path.display());
        for issue in file.row_issues.iter().take(MAX_PRINTED_ISSUES) {
            println!("  row {}: {}", issue.row_number, issue.reason);
        }
        if file.row_issues.len() > MAX_PRINTED_ISSUES {
            println!(
                "  ... and {} more rejected rows",
                file.row_issues.len() - MAX_PRINTED_ISSUES
            );
        }
        for failure in &file.end_check_failures {
            println!("  {}", failure.reason);
        }
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count == 0 {
        Cell::new(count)
    } else {
        Cell::new(count).fg(color)
    }
}
