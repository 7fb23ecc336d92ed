//! Shared type inference logic for data loaders
//!
//! Keeps CSV cells, JSON strings and CLI filter arguments going through
//! the same date and number detection.

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::record::{DataType, DataValue};

/// Date layouts accepted anywhere a day is typed in by hand or arrives in
/// a ledger export. Order matters: ISO first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Type inference utilities
pub struct TypeInference;

impl TypeInference {
    /// Infer the type of a single string value
    ///
    /// Order of checks is important: "1" must stay an integer and
    /// "2025-12-01" must not be mistaken for a float.
    pub fn infer_from_string(value: &str) -> DataType {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return DataType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return DataType::Boolean;
        }

        if value.parse::<i64>().is_ok() {
            return DataType::Integer;
        }

        if value.parse::<f64>().is_ok() {
            return DataType::Float;
        }

        if parse_date(value).is_some() {
            return DataType::Date;
        }

        if parse_datetime(value).is_some() {
            return DataType::DateTime;
        }

        DataType::String
    }

    /// Parse a raw cell into the most specific value it can hold
    pub fn parse_value(value: &str) -> DataValue {
        let inferred = Self::infer_from_string(value);
        DataValue::from_string(value, &inferred)
    }
}

/// Parse a calendar day in one of the accepted layouts
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a timestamp without timezone. RFC 3339 offsets are converted to
/// their naive UTC wall time.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Parse either a day or a timestamp and return the day it falls on
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    parse_date(value).or_else(|| parse_datetime(value).map(|dt| dt.date()))
}
