use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

use crate::data::record::{DataColumn, DataRow, DataType, DataValue, RecordSet};
use crate::data::type_inference::{parse_date, parse_datetime, TypeInference};

/// Rows sampled per column when inferring CSV types
const TYPE_SAMPLE_ROWS: usize = 100;

/// Load a CSV ledger export into a RecordSet keyed by `key_column`
pub fn load_csv_records<P: AsRef<Path>>(path: P, name: &str, key_column: &str) -> Result<RecordSet> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;
    let records = read_csv_records(file, name, key_column)?;
    info!(
        target: "loader",
        "Loaded {} rows from {}",
        records.row_count(),
        path.as_ref().display()
    );
    Ok(records)
}

pub fn read_csv_records<R: Read>(reader: R, name: &str, key_column: &str) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut string_rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed CSV record {}", idx + 1))?;
        string_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    // One type per column, sampled from the leading rows
    let mut column_types = vec![DataType::Null; headers.len()];
    for row in string_rows.iter().take(TYPE_SAMPLE_ROWS) {
        for (col_idx, value) in row.iter().enumerate() {
            if !value.is_empty() {
                let inferred = TypeInference::infer_from_string(value);
                column_types[col_idx] = column_types[col_idx].merge(&inferred);
            }
        }
    }

    let rows = string_rows
        .iter()
        .map(|row| {
            DataRow::new(
                row.iter()
                    .zip(&column_types)
                    .map(|(value, data_type)| DataValue::from_string(value, data_type))
                    .collect(),
            )
        })
        .collect();

    let columns = headers.into_iter().map(DataColumn::new).collect();
    Ok(RecordSet::new(name, columns, rows, key_column)?)
}

/// Load a JSON array of objects into a RecordSet keyed by `key_column`
pub fn load_json_records<P: AsRef<Path>>(path: P, name: &str, key_column: &str) -> Result<RecordSet> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open JSON file: {:?}", path.as_ref()))?;
    let json_data: Vec<JsonValue> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON file: {:?}", path.as_ref()))?;

    let records = json_to_records(json_data, name, key_column)?;
    info!(
        target: "loader",
        "Loaded {} rows from {}",
        records.row_count(),
        path.as_ref().display()
    );
    Ok(records)
}

/// Build a RecordSet from already-parsed JSON objects.
///
/// Columns are the union of object keys in first-seen order; an object
/// missing a key gets a null cell.
pub fn json_to_records(data: Vec<JsonValue>, name: &str, key_column: &str) -> Result<RecordSet> {
    let mut column_names: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(data.len());

    for (idx, item) in data.into_iter().enumerate() {
        let JsonValue::Object(obj) = item else {
            bail!("Entry {} of '{}' is not a JSON object", idx, name);
        };
        for key in obj.keys() {
            if !column_names.iter().any(|c| c == key) {
                column_names.push(key.clone());
            }
        }
        objects.push(obj);
    }

    if column_names.is_empty() {
        column_names.push(key_column.to_string());
    }

    let rows = objects
        .iter()
        .map(|obj| {
            DataRow::new(
                column_names
                    .iter()
                    .map(|col| obj.get(col).map_or(DataValue::Null, json_to_value))
                    .collect(),
            )
        })
        .collect();

    let columns = column_names.into_iter().map(DataColumn::new).collect();
    Ok(RecordSet::new(name, columns, rows, key_column)?)
}

/// JSON strings stay strings unless they hold a date; phone numbers and
/// zero-padded references must not turn into integers.
fn json_to_value(value: &JsonValue) -> DataValue {
    match value {
        JsonValue::Null => DataValue::Null,
        JsonValue::Bool(b) => DataValue::Boolean(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => DataValue::Integer(i),
            None => n.as_f64().map_or(DataValue::Null, DataValue::Float),
        },
        JsonValue::String(s) => {
            if let Some(date) = parse_date(s) {
                DataValue::Date(date)
            } else if let Some(dt) = parse_datetime(s) {
                DataValue::DateTime(dt)
            } else {
                DataValue::String(s.clone())
            }
        }
        JsonValue::Array(_) | JsonValue::Object(_) => DataValue::String(value.to_string()),
    }
}
