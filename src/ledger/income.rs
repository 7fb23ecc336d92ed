//! Income summary: Sanda collections and donations received

use crate::data::column::ColumnDescriptor;
use crate::data::filter::{FilterKind, FilterValue};
use crate::data::table_state::TableState;

pub fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id").label("Transaction ID"),
        ColumnDescriptor::new("date")
            .label("Date")
            .filter(FilterKind::DateRange),
        ColumnDescriptor::new("source")
            .label("Source")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("reference")
            .label("Reference")
            .filter(FilterKind::Text),
        ColumnDescriptor::new("category")
            .label("Category")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("method")
            .label("Method")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("amount")
            .label("Amount")
            .filter(FilterKind::NumberRange),
    ]
}

/// "Income Report (Dec 1 - Dec 5)" while a date filter is active,
/// "Full Income History" otherwise
pub fn report_title(state: &TableState) -> String {
    let bounds = match state.filter("date") {
        Some(FilterValue::DateRange(range)) => range.bounds(),
        _ => None,
    };

    match bounds {
        Some((from, to)) if from == to => {
            format!("Income Report ({})", from.format("%b %-d"))
        }
        Some((from, to)) => format!(
            "Income Report ({} - {})",
            from.format("%b %-d"),
            to.format("%b %-d")
        ),
        None => "Full Income History".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::DateRange;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    #[test]
    fn test_title_without_date_filter() {
        assert_eq!(report_title(&TableState::default()), "Full Income History");
    }

    #[test]
    fn test_title_with_date_range() {
        let mut state = TableState::default();
        state.filters.insert(
            "date".to_string(),
            FilterValue::DateRange(DateRange::new(Some(day(1)), Some(day(5)))),
        );
        assert_eq!(report_title(&state), "Income Report (Dec 1 - Dec 5)");

        state.filters.insert(
            "date".to_string(),
            FilterValue::DateRange(DateRange::single_day(day(4))),
        );
        assert_eq!(report_title(&state), "Income Report (Dec 4)");
    }
}
