//! The back-office screens as table configurations
//!
//! Each ledger is a record set keyed by `id` plus the column descriptors,
//! default sort and export settings of its screen.

pub mod billing;
pub mod community;
pub mod expenses;
pub mod income;
pub mod screen;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::data::column::ColumnDescriptor;
use crate::data::data_exporter::ExportRequest;
use crate::data::engine::TableEngine;
use crate::data::error::TableError;
use crate::data::loaders::{load_csv_records, load_json_records};
use crate::data::record::RecordSet;
use crate::data::table_state::{SortDirection, TableState};

pub const KEY_COLUMN: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Income,
    Expenses,
    Invoices,
    Arrears,
    Donations,
    Members,
}

impl LedgerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerKind::Income => "income",
            LedgerKind::Expenses => "expenses",
            LedgerKind::Invoices => "invoices",
            LedgerKind::Arrears => "arrears",
            LedgerKind::Donations => "donations",
            LedgerKind::Members => "members",
        }
    }

    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        match self {
            LedgerKind::Income => income::columns(),
            LedgerKind::Expenses => expenses::columns(),
            LedgerKind::Invoices => billing::invoice_columns(),
            LedgerKind::Arrears => billing::arrears_columns(),
            LedgerKind::Donations => community::donation_columns(),
            LedgerKind::Members => community::member_columns(),
        }
    }

    /// Sort applied when a screen is first opened
    pub fn default_sort(&self) -> Option<(&'static str, SortDirection)> {
        match self {
            LedgerKind::Income | LedgerKind::Expenses | LedgerKind::Donations => {
                Some(("date", SortDirection::Descending))
            }
            LedgerKind::Arrears => Some(("months_due", SortDirection::Descending)),
            LedgerKind::Invoices | LedgerKind::Members => None,
        }
    }

    /// Numeric column summed into totals and export footers
    pub fn total_column(&self) -> Option<&'static str> {
        match self {
            LedgerKind::Income | LedgerKind::Expenses | LedgerKind::Donations => Some("amount"),
            LedgerKind::Invoices => Some("total_due"),
            LedgerKind::Arrears => Some("arrears"),
            LedgerKind::Members => None,
        }
    }

    /// File name stem for exports, before the date suffix
    pub fn export_stem(&self) -> &'static str {
        match self {
            LedgerKind::Income => "Income_Summary",
            LedgerKind::Expenses => "Expense_Report",
            LedgerKind::Invoices => "Invoices",
            LedgerKind::Arrears => "Outstanding_Arrears",
            LedgerKind::Donations => "Donations",
            LedgerKind::Members => "Members",
        }
    }

    pub fn export_title(&self, state: &TableState) -> String {
        match self {
            LedgerKind::Income => income::report_title(state),
            LedgerKind::Expenses => "Expense Report".to_string(),
            LedgerKind::Invoices => "Monthly Invoices".to_string(),
            LedgerKind::Arrears => "Outstanding Arrears".to_string(),
            LedgerKind::Donations => "Donation Register".to_string(),
            LedgerKind::Members => "Member Directory".to_string(),
        }
    }

    /// Export request for the current state of this ledger's screen
    pub fn export_request(&self, state: &TableState) -> ExportRequest {
        let request = ExportRequest::new(self.export_title(state));
        match self.total_column() {
            Some(column) => request.with_total(column),
            None => request,
        }
    }

    /// Add derived columns the screen shows but the records do not carry
    pub fn prepare(&self, records: RecordSet) -> Result<RecordSet, TableError> {
        match self {
            LedgerKind::Invoices if records.get_column_index("total_due").is_none() => {
                billing::with_total_due(records)
            }
            _ => Ok(records),
        }
    }

    /// Build the engine for this ledger with its default sort applied
    pub fn open(&self, records: RecordSet, page_size: usize) -> Result<TableEngine, TableError> {
        let records = self.prepare(records)?;
        let mut engine = TableEngine::with_page_size(records, self.columns(), page_size)?;
        if let Some((column, direction)) = self.default_sort() {
            engine.set_sort(column, direction);
        }
        Ok(engine)
    }

    /// Load a ledger file; `.csv` files go through the CSV loader, anything
    /// else is read as a JSON array
    pub fn load(&self, path: &Path) -> Result<RecordSet> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        debug!(target: "loader", "Loading {} ledger from {}", self, path.display());
        let records = if is_csv {
            load_csv_records(path, self.name(), KEY_COLUMN)
        } else {
            load_json_records(path, self.name(), KEY_COLUMN)
        };
        records.with_context(|| format!("Failed to load {} ledger", self))
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
