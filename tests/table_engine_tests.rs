use masjid_ledger::data::column::ColumnDescriptor;
use masjid_ledger::data::data_exporter::{CsvExporter, ExportOutcome, ExportRequest};
use masjid_ledger::data::data_view::SelectionStatus;
use masjid_ledger::data::engine::TableEngine;
use masjid_ledger::data::filter::{DateRange, FilterKind, FilterValue};
use masjid_ledger::data::record::{DataColumn, DataRow, DataValue, RecordSet};
use masjid_ledger::data::table_state::SortDirection;
use masjid_ledger::ledger::LedgerKind;

use chrono::NaiveDate;
use std::path::PathBuf;

fn get_test_data_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("data");
    path.push(filename);
    path
}

fn open_ledger(kind: LedgerKind, file: &str, page_size: usize) -> TableEngine {
    let records = kind
        .load(&get_test_data_path(file))
        .expect("Failed to load sample ledger");
    kind.open(records, page_size).expect("Failed to open ledger")
}

fn keys(engine: &TableEngine) -> Vec<String> {
    engine
        .view()
        .filtered_rows()
        .iter()
        .map(|r| r.key().to_string())
        .collect()
}

/// Five invoices with statuses [Unpaid, Unpaid, Paid, Overdue, Unpaid]
#[test]
fn test_five_invoice_scenario() {
    let mut engine = open_ledger(LedgerKind::Invoices, "invoices.json", 10);

    engine.set_filter("status", Some(FilterValue::Category("Unpaid".to_string())));
    assert_eq!(engine.view().filtered_count(), 3);

    engine.set_page_size(2);
    assert_eq!(engine.view().page_count(), 2);
    assert_eq!(engine.view().page(0).len(), 2);
    assert_eq!(engine.view().page(1).len(), 1);

    engine.toggle_select_all_filtered();
    assert_eq!(engine.view().page_rows().len(), 2);
    assert_eq!(engine.view().selected_count(), 3);
    assert_eq!(engine.view().selection_status(), SelectionStatus::All);

    let outcome = engine
        .export_filtered(&CsvExporter, &ExportRequest::new("Unpaid invoices"))
        .unwrap();
    let ExportOutcome::Exported(artifact) = outcome else {
        panic!("expected rows to export");
    };
    assert_eq!(artifact.row_count, 3);

    let text = String::from_utf8(artifact.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("BILL-ABDUL-001,"));
    assert!(lines[2].starts_with("BILL-FAZIL-002,"));
    assert!(lines[3].starts_with("BILL-FATHIMA-005,"));
}

#[test]
fn test_single_day_date_filter_is_inclusive() {
    let mut engine = open_ledger(LedgerKind::Income, "income.json", 10);
    let day = NaiveDate::from_ymd_opt(2025, 12, 4).unwrap();

    engine.set_filter(
        "date",
        Some(FilterValue::DateRange(DateRange::new(Some(day), None))),
    );
    let mut found = keys(&engine);
    found.sort();
    assert_eq!(found, vec!["INC-9002", "INC-9003"]);
}

#[test]
fn test_date_range_and_report_title() {
    let mut engine = open_ledger(LedgerKind::Income, "income.json", 10);
    assert_eq!(
        LedgerKind::Income.export_title(engine.state()),
        "Full Income History"
    );

    engine.set_filter(
        "date",
        FilterValue::parse(FilterKind::DateRange, "2025-12-01..2025-12-05"),
    );
    assert_eq!(engine.view().filtered_count(), 5);
    assert_eq!(engine.filtered_total("amount"), 33950.0);
    assert_eq!(
        LedgerKind::Income.export_title(engine.state()),
        "Income Report (Dec 1 - Dec 5)"
    );
}

#[test]
fn test_filter_idempotence() {
    let mut engine = open_ledger(LedgerKind::Expenses, "expenses.json", 2);
    engine.set_filter("status", Some(FilterValue::Category("Paid".to_string())));
    let once = (engine.state().clone(), keys(&engine));

    engine.set_filter("status", Some(FilterValue::Category("Paid".to_string())));
    assert_eq!(engine.state(), &once.0);
    assert_eq!(keys(&engine), once.1);
}

#[test]
fn test_filters_combine_with_and() {
    let mut engine = open_ledger(LedgerKind::Income, "income.json", 10);
    engine.set_filter("source", Some(FilterValue::Category("Sanda".to_string())));
    engine.set_filter("method", Some(FilterValue::Category("Cash".to_string())));

    let view = engine.view();
    let passing: Vec<String> = view.filtered_rows().iter().map(|r| r.key().to_string()).collect();
    for record in engine.source().records() {
        let matches = record.get("source").and_then(DataValue::as_str) == Some("Sanda")
            && record.get("method").and_then(DataValue::as_str) == Some("Cash");
        assert_eq!(matches, passing.contains(&record.key().to_string()));
    }
    assert_eq!(passing.len(), 3);
}

#[test]
fn test_all_sentinel_clears() {
    let mut engine = open_ledger(LedgerKind::Donations, "donations.json", 10);
    engine.set_filter("purpose", Some(FilterValue::Category("Zakat".to_string())));
    assert_eq!(engine.view().filtered_count(), 1);

    engine.set_filter("purpose", Some(FilterValue::Category("ALL".to_string())));
    assert_eq!(engine.view().filtered_count(), 4);
    assert!(engine.state().filter("purpose").is_none());
}

#[test]
fn test_sort_stability_across_toggles() {
    let rows = (0..12)
        .map(|i| {
            DataRow::new(vec![
                DataValue::String(format!("D-{:02}", i)),
                DataValue::Integer([5000, 2500, 15000][i % 3]),
            ])
        })
        .collect();
    let records = RecordSet::new(
        "donations",
        vec![DataColumn::new("id"), DataColumn::new("amount")],
        rows,
        "id",
    )
    .unwrap();
    let mut engine = TableEngine::new(
        records,
        vec![ColumnDescriptor::new("id"), ColumnDescriptor::new("amount")],
    )
    .unwrap();

    for direction in [
        SortDirection::Ascending,
        SortDirection::Descending,
        SortDirection::Ascending,
        SortDirection::Descending,
    ] {
        engine.set_sort("amount", direction);
        let view = engine.view();
        let rows = view.filtered_rows();
        for pair in rows.windows(2) {
            if pair[0].get("amount") == pair[1].get("amount") {
                assert!(pair[0].index() < pair[1].index());
            }
        }
    }
}

#[test]
fn test_pages_cover_filtered_rows() {
    let mut engine = open_ledger(LedgerKind::Income, "income.json", 3);
    engine.set_sort("amount", SortDirection::Descending);

    for size in [1, 2, 3, 4, 7, 10] {
        engine.set_page_size(size);
        let view = engine.view();
        let mut concatenated = Vec::new();
        for page in 0..view.page_count() {
            let rows = view.page(page);
            assert!(rows.len() <= size);
            concatenated.extend(rows.iter().map(|r| r.index()));
        }
        assert_eq!(concatenated, view.visible_row_indices());
    }
}

#[test]
fn test_selection_totals_exclude_hidden_rows() {
    let mut engine = open_ledger(LedgerKind::Invoices, "invoices.json", 10);
    engine.toggle_select_all_filtered();
    assert_eq!(engine.selected_total("total_due"), 9000.0);

    engine.set_filter("status", Some(FilterValue::Category("Unpaid".to_string())));
    let independent: f64 = engine
        .view()
        .filtered_rows()
        .iter()
        .filter(|r| engine.state().is_selected(r.key()))
        .map(|r| r.number("total_due"))
        .sum();
    assert_eq!(engine.selected_total("total_due"), independent);
    assert_eq!(engine.selected_total("total_due"), 6000.0);

    // Widening the filter again does not bring pruned keys back
    engine.set_filter("status", None);
    assert_eq!(engine.view().selected_count(), 3);
    assert_eq!(engine.view().selection_status(), SelectionStatus::Partial);
}

#[test]
fn test_page_index_clamps() {
    let mut engine = open_ledger(LedgerKind::Income, "income.json", 2);
    engine.set_page(99);
    assert_eq!(engine.state().page_index(), 3);

    engine.set_filter("reference", Some(FilterValue::Text("farook".to_string())));
    assert_eq!(engine.state().page_index(), 0);
    assert_eq!(engine.view().page_count(), 1);

    engine.set_filter("reference", Some(FilterValue::Text("nobody".to_string())));
    engine.set_page(5);
    assert_eq!(engine.view().page_count(), 0);
    assert_eq!(engine.state().page_index(), 0);
    assert!(engine.view().page_rows().is_empty());

    engine.set_page_size(0);
    assert_eq!(engine.state().page_size(), 1);
}

#[test]
fn test_empty_export_is_no_rows() {
    let mut engine = open_ledger(LedgerKind::Expenses, "expenses.json", 10);
    engine.set_filter("payee", Some(FilterValue::Text("nobody".to_string())));
    let outcome = engine
        .export_filtered(&CsvExporter, &ExportRequest::new("Expense Report"))
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::NoRows));
}

#[test]
fn test_arrears_risk_band_filter() {
    let mut engine = open_ledger(LedgerKind::Arrears, "arrears.json", 10);
    engine.set_filter("months_due", Some(FilterValue::Category("high".to_string())));
    assert_eq!(keys(&engine), vec!["M-003"]);

    engine.set_filter("months_due", Some(FilterValue::Category("low".to_string())));
    assert_eq!(keys(&engine), vec!["M-008", "M-004"]);

    // Other filters survive a band change
    engine.set_filter("status", Some(FilterValue::Category("Active".to_string())));
    engine.set_filter("months_due", Some(FilterValue::Category("medium".to_string())));
    assert_eq!(keys(&engine), vec!["M-001"]);
}

#[test]
fn test_unknown_targets_are_noops() {
    let mut engine = open_ledger(LedgerKind::Members, "members.json", 2);
    engine.set_page(1);
    let before = engine.state().clone();

    engine.set_filter("salary", Some(FilterValue::Text("x".to_string())));
    engine.set_filter("id", Some(FilterValue::Text("emp".to_string())));
    engine.set_sort("phone", SortDirection::Ascending);
    engine.set_sort("salary", SortDirection::Ascending);
    engine.toggle_select("emp_99");

    assert_eq!(engine.state(), &before);
}

#[test]
fn test_view_snapshot_survives_mutation() {
    let mut engine = open_ledger(LedgerKind::Donations, "donations.json", 10);
    let snapshot = engine.view().clone();

    engine.set_filter("donor_name", Some(FilterValue::Fuzzy("frdy".to_string())));
    assert_eq!(keys(&engine), vec!["don_4"]);
    assert_eq!(snapshot.filtered_count(), 4);
}

#[test]
fn test_engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TableEngine>();
}
