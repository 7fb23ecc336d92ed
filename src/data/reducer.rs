//! The table reducer: `(state, action) -> state'`
//!
//! Every transition of a table screen goes through `reduce`. It is a pure
//! function of the record set, the column descriptors, the previous state
//! and the action, so the same inputs always give the same state.
//!
//! Invariants kept after every transition:
//! - `page_index` lies in `[0, max(0, page_count - 1)]`
//! - the selection only holds keys of rows that pass the current filters
//! - filters are only stored for filterable columns, in canonical form

use std::collections::BTreeSet;
use tracing::debug;

use crate::data::column::ColumnSet;
use crate::data::data_view::{clamp_page, filter_rows};
use crate::data::record::RecordSet;
use crate::data::table_state::{SortSpec, TableAction, TableState};

/// What the reducer reads besides the state itself
#[derive(Clone, Copy)]
pub struct TableContext<'a> {
    pub source: &'a RecordSet,
    pub columns: &'a ColumnSet,
}

impl<'a> TableContext<'a> {
    pub fn new(source: &'a RecordSet, columns: &'a ColumnSet) -> Self {
        Self { source, columns }
    }

    fn filtered_keys(&self, state: &TableState) -> Vec<&'a str> {
        filter_rows(self.source, self.columns, &state.filters)
            .into_iter()
            .filter_map(|row| self.source.key_of(row))
            .collect()
    }
}

pub fn reduce(ctx: &TableContext<'_>, state: &TableState, action: &TableAction) -> TableState {
    let mut next = state.clone();

    match action {
        TableAction::SetFilter { column, value } => {
            let Some(bound) = ctx.columns.get(column) else {
                debug!(target: "table", "Ignoring filter on unknown column '{}'", column);
                return next;
            };
            if !bound.descriptor.is_filterable() {
                debug!(target: "table", "Ignoring filter on non-filterable column '{}'", column);
                return next;
            }

            // Wrong shape for the column or a clearing value both mean
            // "no constraint from this column"
            let normalized = value
                .clone()
                .filter(|v| bound.descriptor.accepts(v))
                .and_then(|v| v.normalize());

            match normalized {
                Some(v) => {
                    debug!(target: "table", "Filter {} {}", column, v);
                    next.filters.insert(column.clone(), v);
                }
                None => {
                    debug!(target: "table", "Filter on {} cleared", column);
                    next.filters.remove(column);
                }
            }

            next.page_index = 0;
            prune_selection(ctx, &mut next);
        }

        TableAction::ClearFilters => {
            next.filters.clear();
            next.page_index = 0;
        }

        TableAction::SetSort { column, direction } => {
            match ctx.columns.get(column) {
                Some(bound) if bound.descriptor.sortable => {
                    debug!(target: "table", "Sort {} {}", column, direction);
                    next.sort = Some(SortSpec {
                        column: column.clone(),
                        direction: *direction,
                    });
                }
                _ => {
                    debug!(target: "table", "Ignoring sort on '{}'", column);
                }
            }
        }

        TableAction::ClearSort => {
            next.sort = None;
        }

        TableAction::SetPage(index) => {
            let filtered = filter_rows(ctx.source, ctx.columns, &next.filters).len();
            next.page_index = clamp_page(*index, filtered, next.page_size);
        }

        TableAction::SetPageSize(size) => {
            next.page_size = (*size).max(1);
            let filtered = filter_rows(ctx.source, ctx.columns, &next.filters).len();
            next.page_index = clamp_page(next.page_index, filtered, next.page_size);
        }

        TableAction::ToggleSelect(key) => {
            if next.selection.remove(key) {
                return next;
            }
            if ctx.filtered_keys(&next).contains(&key.as_str()) {
                next.selection.insert(key.clone());
            } else {
                debug!(target: "table", "Ignoring selection of hidden or unknown key '{}'", key);
            }
        }

        TableAction::ToggleSelectAllFiltered => {
            let filtered = ctx.filtered_keys(&next);
            let all_selected = !filtered.is_empty()
                && filtered.iter().all(|key| next.selection.contains(*key));

            next.selection = if all_selected {
                BTreeSet::new()
            } else {
                filtered.into_iter().map(str::to_string).collect()
            };
        }

        TableAction::ClearSelection => {
            next.selection.clear();
        }
    }

    next
}

/// Bring a state in line with a replaced record set or descriptor list:
/// drop filters and sort on columns that no longer exist, drop selected
/// keys that are gone or hidden, clamp the page.
pub fn reconcile(ctx: &TableContext<'_>, state: &TableState) -> TableState {
    let mut next = state.clone();

    next.filters
        .retain(|column, _| ctx.columns.get(column).is_some());
    if next
        .sort
        .as_ref()
        .is_some_and(|spec| ctx.columns.get(&spec.column).is_none())
    {
        next.sort = None;
    }

    prune_selection(ctx, &mut next);

    let filtered = filter_rows(ctx.source, ctx.columns, &next.filters).len();
    next.page_index = clamp_page(next.page_index, filtered, next.page_size);
    next
}

fn prune_selection(ctx: &TableContext<'_>, state: &mut TableState) {
    if state.selection.is_empty() {
        return;
    }
    let visible: BTreeSet<&str> = ctx.filtered_keys(state).into_iter().collect();
    state.selection.retain(|key| visible.contains(key.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::ColumnDescriptor;
    use crate::data::filter::{FilterKind, FilterValue};
    use crate::data::record::{DataColumn, DataRow, DataValue};
    use crate::data::table_state::SortDirection;

    fn expenses() -> RecordSet {
        let rows = [
            ("EXP-001", "Utilities", 12500),
            ("EXP-002", "Salaries", 85000),
            ("EXP-003", "Maintenance", 4500),
            ("EXP-004", "Events", 15000),
        ]
        .iter()
        .map(|(id, category, amount)| {
            DataRow::new(vec![
                DataValue::String(id.to_string()),
                DataValue::String(category.to_string()),
                DataValue::Integer(*amount),
            ])
        })
        .collect();

        RecordSet::new(
            "expenses",
            vec![
                DataColumn::new("id"),
                DataColumn::new("category"),
                DataColumn::new("amount"),
            ],
            rows,
            "id",
        )
        .unwrap()
    }

    fn columns(source: &RecordSet) -> ColumnSet {
        ColumnSet::bind(
            vec![
                ColumnDescriptor::new("id").unsortable(),
                ColumnDescriptor::new("category").filter(FilterKind::Category),
                ColumnDescriptor::new("amount"),
            ],
            source,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_resets_page() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(&ctx, &TableState::new(1), &TableAction::SetPage(3));
        assert_eq!(state.page_index(), 3);

        let state = reduce(
            &ctx,
            &state,
            &TableAction::set_filter("category", FilterValue::Category("Events".to_string())),
        );
        assert_eq!(state.page_index(), 0);
    }

    #[test]
    fn test_filter_on_unfilterable_column_is_noop() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);
        let before = reduce(&ctx, &TableState::new(1), &TableAction::SetPage(2));

        let after = reduce(
            &ctx,
            &before,
            &TableAction::set_filter("amount", FilterValue::Text("500".to_string())),
        );
        assert_eq!(after, before);

        let after = reduce(
            &ctx,
            &before,
            &TableAction::set_filter("payee", FilterValue::Text("CEB".to_string())),
        );
        assert_eq!(after, before);
    }

    #[test]
    fn test_mismatched_filter_shape_clears() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(
            &ctx,
            &TableState::default(),
            &TableAction::set_filter("category", FilterValue::Category("Events".to_string())),
        );
        assert!(state.filter("category").is_some());

        let state = reduce(
            &ctx,
            &state,
            &TableAction::set_filter("category", FilterValue::Text("Ev".to_string())),
        );
        assert!(state.filter("category").is_none());
    }

    #[test]
    fn test_sort_on_unsortable_column_is_noop() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(
            &ctx,
            &TableState::default(),
            &TableAction::set_sort("amount", SortDirection::Descending),
        );
        let state = reduce(
            &ctx,
            &state,
            &TableAction::set_sort("id", SortDirection::Ascending),
        );
        assert_eq!(state.sort().unwrap().column, "amount");
    }

    #[test]
    fn test_toggle_select_ignores_hidden_rows() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(
            &ctx,
            &TableState::default(),
            &TableAction::set_filter("category", FilterValue::Category("Events".to_string())),
        );
        let state = reduce(&ctx, &state, &TableAction::ToggleSelect("EXP-001".to_string()));
        assert!(state.selection().is_empty());

        let state = reduce(&ctx, &state, &TableAction::ToggleSelect("EXP-004".to_string()));
        assert!(state.is_selected("EXP-004"));

        let state = reduce(&ctx, &state, &TableAction::ToggleSelect("EXP-004".to_string()));
        assert!(state.selection().is_empty());
    }

    #[test]
    fn test_select_all_toggles() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(&ctx, &TableState::default(), &TableAction::ToggleSelect("EXP-002".to_string()));
        // Partial selection becomes full
        let state = reduce(&ctx, &state, &TableAction::ToggleSelectAllFiltered);
        assert_eq!(state.selection().len(), 4);
        // Full selection becomes empty
        let state = reduce(&ctx, &state, &TableAction::ToggleSelectAllFiltered);
        assert!(state.selection().is_empty());
    }

    #[test]
    fn test_narrowing_filter_prunes_selection() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(&ctx, &TableState::default(), &TableAction::ToggleSelectAllFiltered);
        let state = reduce(
            &ctx,
            &state,
            &TableAction::set_filter("category", FilterValue::Category("Salaries".to_string())),
        );
        assert_eq!(
            state.selection().iter().collect::<Vec<_>>(),
            vec!["EXP-002"]
        );
    }

    #[test]
    fn test_clear_filters() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(
            &ctx,
            &TableState::new(1),
            &TableAction::set_filter("category", FilterValue::Category("Events".to_string())),
        );
        let state = reduce(&ctx, &state, &TableAction::ToggleSelect("EXP-004".to_string()));

        let state = reduce(&ctx, &state, &TableAction::ClearFilters);
        assert!(state.filters().is_empty());
        assert_eq!(state.page_index(), 0);
        // Widening never drops a selected row
        assert!(state.is_selected("EXP-004"));

        let state = reduce(&ctx, &state, &TableAction::SetPage(3));
        assert_eq!(state.page_index(), 3);
    }

    #[test]
    fn test_clear_sort() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let sorted = reduce(
            &ctx,
            &TableState::new(2),
            &TableAction::set_sort("amount", SortDirection::Descending),
        );
        let sorted = reduce(&ctx, &sorted, &TableAction::SetPage(1));

        let state = reduce(&ctx, &sorted, &TableAction::ClearSort);
        assert!(state.sort().is_none());
        assert_eq!(state.page_index(), 1);

        let state = reduce(&ctx, &state, &TableAction::ClearSort);
        assert!(state.sort().is_none());
    }

    #[test]
    fn test_clear_selection() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);

        let state = reduce(
            &ctx,
            &TableState::new(2),
            &TableAction::set_filter("category", FilterValue::Category("Salaries".to_string())),
        );
        let state = reduce(&ctx, &state, &TableAction::ToggleSelectAllFiltered);
        assert_eq!(state.selection().len(), 1);

        let state = reduce(&ctx, &state, &TableAction::ClearSelection);
        assert!(state.selection().is_empty());
        assert!(state.filter("category").is_some());
    }

    #[test]
    fn test_reconcile_drops_missing_keys() {
        let source = expenses();
        let columns = columns(&source);
        let ctx = TableContext::new(&source, &columns);
        let mut state = TableState::new(1);
        state.selection.insert("EXP-404".to_string());
        state.selection.insert("EXP-001".to_string());
        state.page_index = 10;

        let state = reconcile(&ctx, &state);
        assert_eq!(state.selection().len(), 1);
        assert_eq!(state.page_index(), 3);
    }
}
