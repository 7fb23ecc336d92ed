use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::column::{ColumnSet, CompiledFilter};
use crate::data::filter::FilterValue;
use crate::data::record::{DataValue, Record, RecordSet};
use crate::data::table_state::{SortDirection, SortSpec, TableState};

/// Header checkbox state, derived from the selection and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    None,
    Partial,
    All,
}

/// A materialized view over a RecordSet: filtered, sorted, paged and
/// with the current selection resolved, without touching the records.
///
/// Cloning is cheap (the source is shared), so a view can be handed to a
/// reader as a snapshot while the engine moves on.
#[derive(Clone)]
pub struct DataView {
    /// The underlying immutable data source
    source: Arc<RecordSet>,

    /// Row indices that pass every filter, in sorted order
    visible_rows: Vec<usize>,

    /// Subset of visible_rows whose key is selected, in the same order
    selected_rows: Vec<usize>,

    page_index: usize,
    page_size: usize,
}

impl DataView {
    pub fn build(source: Arc<RecordSet>, columns: &ColumnSet, state: &TableState) -> Self {
        let mut visible_rows = filter_rows(&source, columns, &state.filters);
        sort_rows(&source, columns, state.sort.as_ref(), &mut visible_rows);

        let selected_rows = visible_rows
            .iter()
            .copied()
            .filter(|&row| {
                source
                    .key_of(row)
                    .is_some_and(|key| state.selection.contains(key))
            })
            .collect();

        let page_index = clamp_page(state.page_index, visible_rows.len(), state.page_size);

        Self {
            source,
            visible_rows,
            selected_rows,
            page_index,
            page_size: state.page_size.max(1),
        }
    }

    /// Get the source RecordSet
    pub fn source(&self) -> &RecordSet {
        &self.source
    }

    pub fn filtered_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered_count(), self.page_size)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Visible row indices before paging
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Row indices of the current page window
    pub fn page_row_indices(&self) -> &[usize] {
        self.page_slice(self.page_index)
    }

    /// Filtered and sorted rows, unpaginated. This is what export and
    /// totals read.
    pub fn filtered_rows(&self) -> Vec<Record<'_>> {
        self.records(&self.visible_rows)
    }

    pub fn page_rows(&self) -> Vec<Record<'_>> {
        self.records(self.page_row_indices())
    }

    /// Rows of an arbitrary page; out-of-range pages are empty
    pub fn page(&self, index: usize) -> Vec<Record<'_>> {
        self.records(self.page_slice(index))
    }

    pub fn selected_rows(&self) -> Vec<Record<'_>> {
        self.records(&self.selected_rows)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_rows.len()
    }

    pub fn selection_status(&self) -> SelectionStatus {
        match self.selected_count() {
            0 => SelectionStatus::None,
            n if n == self.filtered_count() => SelectionStatus::All,
            _ => SelectionStatus::Partial,
        }
    }

    /// 1-based first and last row numbers of the current page, (0, 0) when
    /// nothing is visible
    pub fn page_bounds(&self) -> (usize, usize) {
        let rows = self.page_row_indices().len();
        if rows == 0 {
            return (0, 0);
        }
        let start = self.page_index * self.page_size;
        (start + 1, start + rows)
    }

    /// Sum of a numeric column over the filtered rows
    pub fn total(&self, column: &str) -> f64 {
        self.sum(&self.visible_rows, column)
    }

    /// Sum of a numeric column over the selected rows that are still visible
    pub fn selected_total(&self, column: &str) -> f64 {
        self.sum(&self.selected_rows, column)
    }

    fn sum(&self, rows: &[usize], column: &str) -> f64 {
        let Some(col_idx) = self.source.get_column_index(column) else {
            return 0.0;
        };
        rows.iter()
            .filter_map(|&row| self.source.get_value(row, col_idx))
            .filter_map(DataValue::as_f64)
            .sum()
    }

    fn page_slice(&self, index: usize) -> &[usize] {
        let start = index.saturating_mul(self.page_size);
        if start >= self.visible_rows.len() {
            return &[];
        }
        let end = (start + self.page_size).min(self.visible_rows.len());
        &self.visible_rows[start..end]
    }

    fn records(&self, rows: &[usize]) -> Vec<Record<'_>> {
        rows.iter()
            .filter_map(|&row| self.source.record(row))
            .collect()
    }
}

pub fn page_count(filtered: usize, page_size: usize) -> usize {
    filtered.div_ceil(page_size.max(1))
}

/// Clamp a page index into `[0, max(0, page_count - 1)]`
pub fn clamp_page(index: usize, filtered: usize, page_size: usize) -> usize {
    index.min(page_count(filtered, page_size).saturating_sub(1))
}

/// Row indices passing every active filter, in source order.
///
/// Filters on columns the descriptors do not know about are skipped.
pub(crate) fn filter_rows(
    source: &RecordSet,
    columns: &ColumnSet,
    filters: &BTreeMap<String, FilterValue>,
) -> Vec<usize> {
    let compiled: Vec<CompiledFilter<'_>> = filters
        .iter()
        .filter_map(|(key, value)| columns.get(key).map(|c| CompiledFilter::new(c, value)))
        .collect();

    (0..source.row_count())
        .filter(|&row| compiled.iter().all(|f| f.matches(source, row)))
        .collect()
}

/// Sort row indices by the active sort key. Ties keep source order in
/// both directions.
pub(crate) fn sort_rows(
    source: &RecordSet,
    columns: &ColumnSet,
    sort: Option<&SortSpec>,
    rows: &mut [usize],
) {
    let Some(spec) = sort else {
        return;
    };
    let Some(column) = columns.get(&spec.column) else {
        return;
    };

    rows.sort_by(|&a, &b| {
        let val_a = source.get_value(a, column.position).unwrap_or(&DataValue::Null);
        let val_b = source.get_value(b, column.position).unwrap_or(&DataValue::Null);

        let cmp = column.descriptor.compare(val_a, val_b);
        let cmp = match spec.direction {
            SortDirection::Ascending => cmp,
            SortDirection::Descending => cmp.reverse(),
        };
        cmp.then(a.cmp(&b))
    });
}
