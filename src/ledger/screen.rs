//! Table operations typed on the command line, replayed against an engine
//! in the order a user works a screen: filters, sort, page size, page,
//! selection.

use tracing::debug;

use crate::data::data_view::SelectionStatus;
use crate::data::engine::TableEngine;
use crate::data::filter::{FilterValue, ALL_SENTINEL};
use crate::data::table_state::SortDirection;

#[derive(Debug, Clone, Default)]
pub struct ScreenRequest {
    /// `(column, raw value)` pairs, parsed by each column's filter kind
    pub filters: Vec<(String, String)>,
    pub sort: Option<(String, SortDirection)>,
    /// 1-based page number
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub select_all: bool,
    pub select: Vec<String>,
}

/// `column=value`
pub fn parse_filter_arg(s: &str) -> Result<(String, String), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", s))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((column.to_string(), value.trim().to_string()))
}

/// `column` or `column:asc|desc`
pub fn parse_sort_arg(s: &str) -> Result<(String, SortDirection), String> {
    match s.split_once(':') {
        Some((column, direction)) => Ok((column.trim().to_string(), direction.parse()?)),
        None => Ok((s.trim().to_string(), SortDirection::Ascending)),
    }
}

impl ScreenRequest {
    /// Apply every requested operation. Operations the engine would ignore
    /// are still applied (as no-ops) and reported back as warnings.
    pub fn apply(&self, engine: &mut TableEngine) -> Vec<String> {
        let mut warnings = Vec::new();

        for (column, raw) in &self.filters {
            let kind = match engine.columns().get(column) {
                None => {
                    warnings.push(format!("Unknown column '{}', filter ignored", column));
                    continue;
                }
                Some(bound) => match bound.descriptor.filter_kind {
                    Some(kind) => kind,
                    None => {
                        warnings.push(format!("Column '{}' cannot be filtered", column));
                        continue;
                    }
                },
            };

            let value = FilterValue::parse(kind, raw);
            if value.is_none() && !raw.is_empty() && !raw.eq_ignore_ascii_case(ALL_SENTINEL) {
                warnings.push(format!(
                    "Could not read '{}' as a {:?} filter for '{}', showing all rows",
                    raw, kind, column
                ));
            }
            debug!(target: "table", "Filter argument {}={} -> {:?}", column, raw, value);
            engine.set_filter(column, value);
        }

        if let Some((column, direction)) = &self.sort {
            let sortable = engine
                .columns()
                .get(column)
                .map(|bound| bound.descriptor.sortable);
            match sortable {
                Some(true) => engine.set_sort(column, *direction),
                Some(false) => warnings.push(format!("Column '{}' cannot be sorted", column)),
                None => warnings.push(format!("Unknown column '{}', sort ignored", column)),
            }
        }

        if let Some(size) = self.page_size {
            engine.set_page_size(size);
        }

        if let Some(page) = self.page {
            engine.set_page(page.saturating_sub(1));
            if page > engine.view().page_count().max(1) {
                warnings.push(format!(
                    "Page {} is past the end, showing page {}",
                    page,
                    engine.view().page_index() + 1
                ));
            }
        }

        if self.select_all && engine.view().selection_status() != SelectionStatus::All {
            engine.toggle_select_all_filtered();
        }

        for key in &self.select {
            if engine.state().is_selected(key) {
                continue;
            }
            engine.toggle_select(key);
            if !engine.state().is_selected(key) {
                warnings.push(format!("'{}' is not among the filtered rows", key));
            }
        }

        warnings
    }
}
