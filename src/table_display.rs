use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use crossterm::style::Stylize;

use masjid_ledger::data::data_exporter::format_amount;
use masjid_ledger::data::data_view::SelectionStatus;
use masjid_ledger::data::engine::TableEngine;
use masjid_ledger::data::record::DataValue;

/// Print the current page of a ledger followed by its status line
pub fn display_page(engine: &TableEngine, total_column: Option<&str>, currency: &str) {
    let view = engine.view();

    if view.filtered_count() == 0 {
        println!("{}", "No records match the current filters.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let marker = match view.selection_status() {
        SelectionStatus::None => "[ ]",
        SelectionStatus::Partial => "[-]",
        SelectionStatus::All => "[x]",
    };
    let mut headers = vec![Cell::new(marker).add_attribute(Attribute::Bold)];
    headers.extend(
        engine
            .columns()
            .iter()
            .map(|c| Cell::new(&c.descriptor.label).add_attribute(Attribute::Bold)),
    );
    table.set_header(headers);

    for record in view.page_rows() {
        let check = if engine.state().is_selected(record.key()) {
            "[x]"
        } else {
            "[ ]"
        };
        let mut row = vec![Cell::new(check)];
        row.extend(engine.columns().iter().map(|c| {
            let value = record.get_at(c.position).unwrap_or(&DataValue::Null);
            let cell = Cell::new(value.to_string());
            match value {
                DataValue::Integer(_) | DataValue::Float(_) => {
                    cell.set_alignment(CellAlignment::Right)
                }
                _ => cell,
            }
        }));
        table.add_row(row);
    }

    println!("{table}");

    let (first, last) = view.page_bounds();
    let mut status = format!(
        "Rows {}-{} of {} | Page {}/{}",
        first,
        last,
        view.filtered_count(),
        view.page_index() + 1,
        view.page_count().max(1)
    );
    if let Some(column) = total_column {
        status.push_str(&format!(
            " | Filtered total: {} {}",
            currency,
            format_amount(view.total(column))
        ));
    }
    if view.selected_count() > 0 {
        status.push_str(&format!(" | Selected: {}", view.selected_count()));
        if let Some(column) = total_column {
            status.push_str(&format!(
                " ({} {})",
                currency,
                format_amount(view.selected_total(column))
            ));
        }
    }

    println!("\n{}", status.green());
}
