use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::data::error::TableError;
use crate::data::type_inference::{parse_date, parse_datetime, parse_day};

/// Represents the data type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Null,
    Mixed, // For columns with mixed types
}

impl DataType {
    /// Merge two types (for columns with mixed types)
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return *self;
        }

        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => *t,
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            (DataType::Date, DataType::DateTime) | (DataType::DateTime, DataType::Date) => {
                DataType::DateTime
            }
            _ => DataType::Mixed,
        }
    }
}

/// Column metadata and definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub null_count: usize,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            nullable: true,
            null_count: 0,
        }
    }
}

/// A single cell value in a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl DataValue {
    pub fn from_string(s: &str, data_type: &DataType) -> Self {
        if s.is_empty() || s.eq_ignore_ascii_case("null") {
            return DataValue::Null;
        }

        let fallback = || DataValue::String(s.to_string());
        match data_type {
            DataType::String => DataValue::String(s.to_string()),
            DataType::Integer => s
                .parse::<i64>()
                .map(DataValue::Integer)
                .unwrap_or_else(|_| fallback()),
            DataType::Float => s
                .parse::<f64>()
                .map(DataValue::Float)
                .unwrap_or_else(|_| fallback()),
            DataType::Boolean => {
                let lower = s.to_lowercase();
                DataValue::Boolean(lower == "true" || lower == "1" || lower == "yes")
            }
            DataType::Date => parse_date(s).map(DataValue::Date).unwrap_or_else(fallback),
            DataType::DateTime => parse_datetime(s)
                .map(DataValue::DateTime)
                .unwrap_or_else(fallback),
            DataType::Null => DataValue::Null,
            DataType::Mixed => crate::data::type_inference::TypeInference::parse_value(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Date(_) => DataType::Date,
            DataValue::DateTime(_) => DataType::DateTime,
            DataValue::Null => DataType::Null,
        }
    }

    /// Numeric view of the value, used by range filters and totals
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// The calendar day this value falls on, with time-of-day stripped
    pub fn as_day(&self) -> Option<NaiveDate> {
        match self {
            DataValue::Date(d) => Some(*d),
            DataValue::DateTime(dt) => Some(dt.date()),
            DataValue::String(s) => parse_day(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DataValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            DataValue::Null => write!(f, ""),
        }
    }
}

/// A row of data in the record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An immutable, keyed collection of ledger rows.
///
/// Every row carries a unique, non-null value in the key column. The key is
/// what selection tracks, so it is validated once here and never inferred.
#[derive(Debug, Clone)]
pub struct RecordSet {
    name: String,
    columns: Vec<DataColumn>,
    rows: Vec<DataRow>,
    key_column: usize,
    keys: Vec<String>,
    key_index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<DataColumn>,
        rows: Vec<DataRow>,
        key_column: &str,
    ) -> Result<Self, TableError> {
        let key_idx = columns
            .iter()
            .position(|c| c.name == key_column)
            .ok_or_else(|| TableError::MissingKeyColumn(key_column.to_string()))?;

        let mut keys = Vec::with_capacity(rows.len());
        let mut key_index = HashMap::with_capacity(rows.len());

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row: row_idx,
                    found: row.len(),
                    expected: columns.len(),
                });
            }

            let key = match row.get(key_idx) {
                Some(value) if !value.is_null() => value.to_string(),
                _ => {
                    return Err(TableError::NullKey {
                        row: row_idx,
                        column: key_column.to_string(),
                    })
                }
            };

            if let Some(&first) = key_index.get(&key) {
                return Err(TableError::DuplicateKey {
                    key,
                    first,
                    second: row_idx,
                });
            }
            key_index.insert(key.clone(), row_idx);
            keys.push(key);
        }

        let mut set = Self {
            name: name.into(),
            columns,
            rows,
            key_column: key_idx,
            keys,
            key_index,
        };
        set.infer_column_types();

        debug!(
            target: "table",
            "Built record set '{}' with {} columns and {} rows",
            set.name,
            set.column_count(),
            set.row_count()
        );

        Ok(set)
    }

    /// Append a column computed from the other values of each row
    pub fn with_derived_column<F>(mut self, name: &str, derive: F) -> Result<Self, TableError>
    where
        F: Fn(Record<'_>) -> DataValue,
    {
        if self.get_column_index(name).is_some() {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }

        let derived: Vec<DataValue> = (0..self.row_count())
            .map(|idx| derive(Record::new(&self, idx)))
            .collect();

        self.columns.push(DataColumn::new(name));
        for (row, value) in self.rows.iter_mut().zip(derived) {
            row.values.push(value);
        }
        self.infer_column_types();

        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn key_column_name(&self) -> &str {
        &self.columns[self.key_column].name
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get column names as a vector
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Get a value at specific row and column
    pub fn get_value(&self, row: usize, col: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(col)
    }

    /// Get a value by row index and column name
    pub fn get_value_by_name(&self, row: usize, col_name: &str) -> Option<&DataValue> {
        let col_idx = self.get_column_index(col_name)?;
        self.get_value(row, col_idx)
    }

    pub fn key_of(&self, row: usize) -> Option<&str> {
        self.keys.get(row).map(String::as_str)
    }

    pub fn position_of_key(&self, key: &str) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.row_count()).then(|| Record::new(self, row))
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.row_count()).map(move |idx| Record::new(self, idx))
    }

    /// Infer and update column types based on data
    fn infer_column_types(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            let mut inferred_type = DataType::Null;
            let mut null_count = 0;

            for row in &self.rows {
                if let Some(value) = row.get(col_idx) {
                    if value.is_null() {
                        null_count += 1;
                    } else {
                        inferred_type = inferred_type.merge(&value.data_type());
                    }
                }
            }

            column.data_type = inferred_type;
            column.null_count = null_count;
            column.nullable = null_count > 0;
        }
    }
}

/// Borrowed view of one row, addressable by column name
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    set: &'a RecordSet,
    index: usize,
}

impl<'a> Record<'a> {
    fn new(set: &'a RecordSet, index: usize) -> Self {
        Self { set, index }
    }

    /// Position of this record in the source collection
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &'a str {
        self.set.keys[self.index].as_str()
    }

    pub fn get(&self, column: &str) -> Option<&'a DataValue> {
        self.set.get_value_by_name(self.index, column)
    }

    pub fn get_at(&self, column: usize) -> Option<&'a DataValue> {
        self.set.get_value(self.index, column)
    }

    /// Numeric value of a column, zero when missing or not a number
    pub fn number(&self, column: &str) -> f64 {
        self.get(column).and_then(DataValue::as_f64).unwrap_or(0.0)
    }

    pub fn values(&self) -> &'a [DataValue] {
        &self.set.rows[self.index].values
    }
}
