use crate::data::record::DataValue;
use std::cmp::Ordering;

/// Compare two DataValues for sorting.
///
/// Numbers compare by value across Integer/Float. Strings compare
/// case-insensitively first so "abdul" and "Abdul" sit together, then
/// byte-wise to keep the order total. Dates and date-times compare on the
/// same timeline (a bare date is midnight).
///
/// Cross-type order: Null < Boolean < numbers < String < Date/DateTime
pub fn compare_values(a: &DataValue, b: &DataValue) -> Ordering {
    match (a, b) {
        (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),
        (DataValue::Float(a), DataValue::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (DataValue::Integer(i), DataValue::Float(f)) => {
            (*i as f64).partial_cmp(f).unwrap_or(Ordering::Equal)
        }
        (DataValue::Float(f), DataValue::Integer(i)) => {
            f.partial_cmp(&(*i as f64)).unwrap_or(Ordering::Equal)
        }

        (DataValue::String(a), DataValue::String(b)) => compare_text(a, b),

        (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),

        (DataValue::Date(a), DataValue::Date(b)) => a.cmp(b),
        (DataValue::DateTime(a), DataValue::DateTime(b)) => a.cmp(b),
        (DataValue::Date(d), DataValue::DateTime(dt)) => d
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.cmp(dt))
            .unwrap_or(Ordering::Equal),
        (DataValue::DateTime(dt), DataValue::Date(d)) => d
            .and_hms_opt(0, 0, 0)
            .map(|midnight| dt.cmp(&midnight))
            .unwrap_or(Ordering::Equal),

        (DataValue::Null, DataValue::Null) => Ordering::Equal,
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn type_rank(value: &DataValue) -> u8 {
    match value {
        DataValue::Null => 0,
        DataValue::Boolean(_) => 1,
        DataValue::Integer(_) | DataValue::Float(_) => 2,
        DataValue::String(_) => 3,
        DataValue::Date(_) | DataValue::DateTime(_) => 4,
    }
}
