use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::data::filter::FilterValue;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// The single active sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Everything a table screen remembers between renders.
///
/// Only the reducer produces new states; fields are read through getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub(crate) filters: BTreeMap<String, FilterValue>,
    pub(crate) sort: Option<SortSpec>,
    pub(crate) page_index: usize,
    pub(crate) page_size: usize,
    pub(crate) selection: BTreeSet<String>,
}

impl TableState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: BTreeMap::new(),
            sort: None,
            page_index: 0,
            page_size: page_size.max(1),
            selection: BTreeSet::new(),
        }
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn filter(&self, column: &str) -> Option<&FilterValue> {
        self.filters.get(column)
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// The transitions a table screen can request
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    /// Replace or clear (`None`, empty, `"all"`) one column's filter
    SetFilter {
        column: String,
        value: Option<FilterValue>,
    },
    ClearFilters,
    SetSort {
        column: String,
        direction: SortDirection,
    },
    ClearSort,
    SetPage(usize),
    SetPageSize(usize),
    ToggleSelect(String),
    ToggleSelectAllFiltered,
    ClearSelection,
}

impl TableAction {
    pub fn set_filter(column: impl Into<String>, value: FilterValue) -> Self {
        TableAction::SetFilter {
            column: column.into(),
            value: Some(value),
        }
    }

    pub fn set_sort(column: impl Into<String>, direction: SortDirection) -> Self {
        TableAction::SetSort {
            column: column.into(),
            direction,
        }
    }
}
