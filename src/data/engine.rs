use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::data::column::{ColumnDescriptor, ColumnSet};
use crate::data::data_exporter::{ExportOutcome, ExportRequest, ExportSerializer};
use crate::data::data_view::DataView;
use crate::data::error::TableError;
use crate::data::filter::FilterValue;
use crate::data::record::RecordSet;
use crate::data::reducer::{reconcile, reduce, TableContext};
use crate::data::table_state::{SortDirection, TableAction, TableState, DEFAULT_PAGE_SIZE};

/// Owns a ledger's records, its column descriptors and the table state,
/// and keeps a materialized view in step with them.
///
/// Mutation goes through `dispatch` (or the named helpers that wrap it),
/// which runs the pure reducer and rebuilds the view. The engine expects a
/// single writer; readers can clone the view as a snapshot.
pub struct TableEngine {
    source: Arc<RecordSet>,
    columns: ColumnSet,
    state: TableState,
    view: DataView,
}

impl TableEngine {
    pub fn new(source: RecordSet, columns: Vec<ColumnDescriptor>) -> Result<Self, TableError> {
        Self::with_page_size(source, columns, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        source: RecordSet,
        columns: Vec<ColumnDescriptor>,
        page_size: usize,
    ) -> Result<Self, TableError> {
        let columns = ColumnSet::bind(columns, &source)?;
        Ok(Self::from_parts(Arc::new(source), columns, page_size))
    }

    /// Engine with a text filter on every column of the record set
    pub fn inferred(source: RecordSet) -> Self {
        let columns = ColumnSet::inferred(&source);
        Self::from_parts(Arc::new(source), columns, DEFAULT_PAGE_SIZE)
    }

    fn from_parts(source: Arc<RecordSet>, columns: ColumnSet, page_size: usize) -> Self {
        let state = TableState::new(page_size);
        let view = DataView::build(source.clone(), &columns, &state);
        info!(
            target: "table",
            "Table '{}' ready: {} rows, {} columns described",
            source.name(),
            source.row_count(),
            columns.len()
        );
        Self {
            source,
            columns,
            state,
            view,
        }
    }

    /// Apply one action and rematerialize the view
    pub fn dispatch(&mut self, action: TableAction) {
        let ctx = TableContext::new(&self.source, &self.columns);
        let next = reduce(&ctx, &self.state, &action);
        if next == self.state {
            debug!(target: "table", "{:?} left state unchanged", action);
            return;
        }
        self.state = next;
        self.refresh_view();
    }

    pub fn set_filter(&mut self, column: &str, value: Option<FilterValue>) {
        self.dispatch(TableAction::SetFilter {
            column: column.to_string(),
            value,
        });
    }

    pub fn clear_filters(&mut self) {
        self.dispatch(TableAction::ClearFilters);
    }

    pub fn set_sort(&mut self, column: &str, direction: SortDirection) {
        self.dispatch(TableAction::set_sort(column, direction));
    }

    pub fn clear_sort(&mut self) {
        self.dispatch(TableAction::ClearSort);
    }

    pub fn set_page(&mut self, index: usize) {
        self.dispatch(TableAction::SetPage(index));
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.dispatch(TableAction::SetPageSize(size));
    }

    pub fn toggle_select(&mut self, key: &str) {
        self.dispatch(TableAction::ToggleSelect(key.to_string()));
    }

    pub fn toggle_select_all_filtered(&mut self) {
        self.dispatch(TableAction::ToggleSelectAllFiltered);
    }

    pub fn clear_selection(&mut self) {
        self.dispatch(TableAction::ClearSelection);
    }

    /// Swap in a freshly fetched collection. Filters, sort and page survive;
    /// selection keeps only keys that still exist and pass the filters.
    pub fn replace_records(&mut self, source: RecordSet) -> Result<(), TableError> {
        let columns = self.columns.rebind(&source)?;
        let source = Arc::new(source);

        let ctx = TableContext::new(&source, &columns);
        let state = reconcile(&ctx, &self.state);

        info!(
            target: "table",
            "Replaced records of '{}': {} -> {} rows",
            self.source.name(),
            self.source.row_count(),
            source.row_count()
        );

        self.source = source;
        self.columns = columns;
        self.state = state;
        self.refresh_view();
        Ok(())
    }

    /// The current materialized view (getView)
    pub fn view(&self) -> &DataView {
        &self.view
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn source(&self) -> &RecordSet {
        &self.source
    }

    pub fn filtered_total(&self, column: &str) -> f64 {
        self.view.total(column)
    }

    pub fn selected_total(&self, column: &str) -> f64 {
        self.view.selected_total(column)
    }

    /// Serialize the filtered, sorted, unpaginated rows.
    ///
    /// An empty filtered view is reported as `ExportOutcome::NoRows`, not
    /// as an error and not as an empty file.
    pub fn export_filtered(
        &self,
        serializer: &dyn ExportSerializer,
        request: &ExportRequest,
    ) -> Result<ExportOutcome> {
        crate::data::data_exporter::export_view(&self.view, &self.columns, serializer, request)
    }

    /// Serialize the selected rows that pass the current filters.
    ///
    /// An empty selection is reported as `ExportOutcome::NoRows`.
    pub fn export_selected(
        &self,
        serializer: &dyn ExportSerializer,
        request: &ExportRequest,
    ) -> Result<ExportOutcome> {
        crate::data::data_exporter::export_selection(&self.view, &self.columns, serializer, request)
    }

    fn refresh_view(&mut self) {
        self.view = DataView::build(self.source.clone(), &self.columns, &self.state);
        debug!(
            target: "table",
            "View: {} filtered, page {}/{}, {} selected",
            self.view.filtered_count(),
            self.view.page_index() + 1,
            self.view.page_count().max(1),
            self.view.selected_count()
        );
    }
}
