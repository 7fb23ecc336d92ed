use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::data::error::TableError;
use crate::data::filter::{FilterKind, FilterPredicate, FilterValue};
use crate::data::record::{DataValue, RecordSet};
use crate::data::value_compare::compare_values;

/// Custom filter: receives the cell and the stored filter value
pub type FilterFn = Arc<dyn Fn(&DataValue, &FilterValue) -> bool + Send + Sync>;

/// Custom sort comparator for one column
pub type CompareFn = Arc<dyn Fn(&DataValue, &DataValue) -> Ordering + Send + Sync>;

/// Describes how one column of a ledger may be filtered, sorted and exported
#[derive(Clone)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub filter_kind: Option<FilterKind>,
    pub sortable: bool,
    custom_filter: Option<FilterFn>,
    custom_compare: Option<CompareFn>,
}

impl ColumnDescriptor {
    /// A sortable, non-filterable column labelled by its key
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            filter_kind: None,
            sortable: true,
            custom_filter: None,
            custom_compare: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn filter(mut self, kind: FilterKind) -> Self {
        self.filter_kind = Some(kind);
        self
    }

    /// Filter with a custom predicate. Values stored for this column must
    /// still be of `kind`.
    pub fn filter_with<F>(mut self, kind: FilterKind, predicate: F) -> Self
    where
        F: Fn(&DataValue, &FilterValue) -> bool + Send + Sync + 'static,
    {
        self.filter_kind = Some(kind);
        self.custom_filter = Some(Arc::new(predicate));
        self
    }

    pub fn compare_with<F>(mut self, compare: F) -> Self
    where
        F: Fn(&DataValue, &DataValue) -> Ordering + Send + Sync + 'static,
    {
        self.custom_compare = Some(Arc::new(compare));
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn is_filterable(&self) -> bool {
        self.filter_kind.is_some()
    }

    /// Does the stored value have the shape this column filters by
    pub fn accepts(&self, value: &FilterValue) -> bool {
        self.filter_kind == Some(value.kind())
    }

    pub fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        match &self.custom_compare {
            Some(compare) => compare(a, b),
            None => compare_values(a, b),
        }
    }

    pub(crate) fn has_custom_filter(&self) -> bool {
        self.custom_filter.is_some()
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("filter_kind", &self.filter_kind)
            .field("sortable", &self.sortable)
            .field("custom_filter", &self.custom_filter.is_some())
            .field("custom_compare", &self.custom_compare.is_some())
            .finish()
    }
}

/// Column descriptors bound to the positions of their columns in a record set
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
    positions: Vec<usize>,
}

impl ColumnSet {
    /// Resolve every descriptor against the record set. A descriptor naming
    /// a column the records do not have is a construction error.
    pub fn bind(columns: Vec<ColumnDescriptor>, source: &RecordSet) -> Result<Self, TableError> {
        let positions = columns
            .iter()
            .map(|c| {
                source
                    .get_column_index(&c.key)
                    .ok_or_else(|| TableError::UnknownColumn(c.key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns, positions })
    }

    /// Descriptors for every column of the record set, all sortable and
    /// text-filterable
    pub fn inferred(source: &RecordSet) -> Self {
        let columns = source
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name.clone()).filter(FilterKind::Text))
            .collect();
        Self {
            columns,
            positions: (0..source.column_count()).collect(),
        }
    }

    /// Re-resolve positions against a replacement record set
    pub fn rebind(&self, source: &RecordSet) -> Result<Self, TableError> {
        Self::bind(self.columns.clone(), source)
    }

    pub fn get(&self, key: &str) -> Option<BoundColumn<'_>> {
        self.columns
            .iter()
            .zip(&self.positions)
            .find(|(c, _)| c.key == key)
            .map(|(descriptor, &position)| BoundColumn {
                descriptor,
                position,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = BoundColumn<'_>> {
        self.columns
            .iter()
            .zip(&self.positions)
            .map(|(descriptor, &position)| BoundColumn {
                descriptor,
                position,
            })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A descriptor together with its column position in the source
#[derive(Debug, Clone, Copy)]
pub struct BoundColumn<'a> {
    pub descriptor: &'a ColumnDescriptor,
    pub position: usize,
}

/// A column filter ready to run over rows
pub(crate) struct CompiledFilter<'a> {
    column: BoundColumn<'a>,
    value: &'a FilterValue,
    predicate: FilterPredicate,
}

impl<'a> CompiledFilter<'a> {
    pub(crate) fn new(column: BoundColumn<'a>, value: &'a FilterValue) -> Self {
        let predicate = if column.descriptor.has_custom_filter() {
            FilterPredicate::Unconstrained
        } else {
            FilterPredicate::compile(value)
        };
        Self {
            column,
            value,
            predicate,
        }
    }

    pub(crate) fn matches(&self, source: &RecordSet, row: usize) -> bool {
        let cell = source
            .get_value(row, self.column.position)
            .unwrap_or(&DataValue::Null);
        match &self.column.descriptor.custom_filter {
            Some(custom) => custom(cell, self.value),
            None => self.predicate.matches(cell),
        }
    }
}
