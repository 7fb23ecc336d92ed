//! Monthly Sanda billing: invoices and the arrears (outstanding) register

use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::data::column::ColumnDescriptor;
use crate::data::data_exporter::ExportBatch;
use crate::data::error::TableError;
use crate::data::filter::{FilterKind, FilterValue};
use crate::data::record::{DataValue, Record, RecordSet};

pub fn invoice_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id").label("Invoice ID"),
        ColumnDescriptor::new("name")
            .label("Member")
            .filter(FilterKind::Text),
        ColumnDescriptor::new("month")
            .label("Month")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("amount").label("Amount"),
        ColumnDescriptor::new("arrears").label("Arrears"),
        ColumnDescriptor::new("total_due")
            .label("Total Due")
            .filter(FilterKind::NumberRange),
        ColumnDescriptor::new("status")
            .label("Status")
            .filter(FilterKind::Category)
            .compare_with(|a, b| status_rank(a).cmp(&status_rank(b))),
        ColumnDescriptor::new("due_date")
            .label("Due Date")
            .filter(FilterKind::DateRange),
    ]
}

/// Overdue first, then unpaid, then settled
fn status_rank(value: &DataValue) -> u8 {
    match value.as_str() {
        Some("Overdue") => 0,
        Some("Unpaid") => 1,
        Some("Paid") => 2,
        _ => 3,
    }
}

/// Add `total_due = amount + arrears` to an invoice record set
pub fn with_total_due(records: RecordSet) -> Result<RecordSet, TableError> {
    records.with_derived_column("total_due", |r| {
        match (r.get("amount"), r.get("arrears")) {
            (Some(DataValue::Integer(a)), Some(DataValue::Integer(b))) => match a.checked_add(*b) {
                Some(sum) => DataValue::Integer(sum),
                None => DataValue::Float(*a as f64 + *b as f64),
            },
            (Some(DataValue::Integer(a)), Some(DataValue::Null) | None) => DataValue::Integer(*a),
            _ => DataValue::Float(r.number("amount") + r.number("arrears")),
        }
    })
}

/// How far behind a member is on Sanda payments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    /// More than six months due
    High,
    /// Three to six months due
    Medium,
    /// Fewer than three months due
    Low,
}

impl RiskBand {
    pub fn of(months_due: f64) -> Self {
        if months_due > 6.0 {
            RiskBand::High
        } else if months_due >= 3.0 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

impl FromStr for RiskBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(RiskBand::High),
            "medium" => Ok(RiskBand::Medium),
            "low" => Ok(RiskBand::Low),
            other => Err(format!("unknown risk band '{}'", other)),
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBand::High => write!(f, "high"),
            RiskBand::Medium => write!(f, "medium"),
            RiskBand::Low => write!(f, "low"),
        }
    }
}

/// Band predicate for the months_due column. An unrecognised band matches
/// nothing, like any other unknown category.
fn risk_band_filter(cell: &DataValue, value: &FilterValue) -> bool {
    let FilterValue::Category(band) = value else {
        return true;
    };
    match (band.parse::<RiskBand>(), cell.as_f64()) {
        (Ok(band), Some(months)) => RiskBand::of(months) == band,
        _ => false,
    }
}

pub fn arrears_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id").label("Member ID"),
        ColumnDescriptor::new("name")
            .label("Member")
            .filter(FilterKind::Text),
        ColumnDescriptor::new("phone").label("Phone").unsortable(),
        ColumnDescriptor::new("arrears")
            .label("Arrears")
            .filter(FilterKind::NumberRange),
        ColumnDescriptor::new("months_due")
            .label("Months Due")
            .filter_with(FilterKind::Category, risk_band_filter),
        ColumnDescriptor::new("last_paid")
            .label("Last Paid")
            .filter(FilterKind::DateRange),
        ColumnDescriptor::new("status")
            .label("Status")
            .filter(FilterKind::Category),
    ]
}

/// Ten years of monthly lines
const MAX_STATEMENT_MONTHS: u32 = 120;

/// Statement of accounts for one member of the arrears register: one
/// unpaid line per month due, counting back from the month of `as_of`,
/// closed by the outstanding total.
pub fn statement_breakdown(member: Record<'_>, as_of: NaiveDate) -> ExportBatch {
    let arrears = member.number("arrears");
    let months_due = member.number("months_due");
    let months_due = if months_due.is_finite() {
        months_due.round().clamp(0.0, MAX_STATEMENT_MONTHS as f64) as u32
    } else {
        0
    };
    let name = member
        .get("name")
        .map(|v| v.to_string())
        .unwrap_or_default();

    let first_of_month = as_of.with_day(1).unwrap_or(as_of);
    let per_month = if months_due > 0 {
        arrears / months_due as f64
    } else {
        0.0
    };

    let rows = (0..months_due)
        .filter_map(|i| first_of_month.checked_sub_months(Months::new(i)))
        .map(|month| {
            vec![
                DataValue::String(month.format("%B %Y").to_string()),
                DataValue::String("Unpaid".to_string()),
                DataValue::Float(per_month),
            ]
        })
        .collect();

    ExportBatch {
        title: format!("Statement of Accounts - {} ({})", name, member.key()),
        headers: vec![
            "Month".to_string(),
            "Status".to_string(),
            "Amount Due (LKR)".to_string(),
        ],
        rows,
        total: Some(arrears),
        total_label: "TOTAL OUTSTANDING".to_string(),
        currency: "Rs.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::ColumnSet;
    use crate::data::record::{DataColumn, DataRow};

    fn arrears() -> RecordSet {
        let rows = [
            ("M-001", "Abdul Rahman", 5000, 5),
            ("M-003", "Yusuf Khan", 12000, 12),
            ("M-004", "Zaid Ahmed", 1000, 1),
        ]
        .iter()
        .map(|(id, name, arrears, months)| {
            DataRow::new(vec![
                DataValue::String(id.to_string()),
                DataValue::String(name.to_string()),
                DataValue::Integer(*arrears),
                DataValue::Integer(*months),
            ])
        })
        .collect();

        RecordSet::new(
            "arrears",
            vec![
                DataColumn::new("id"),
                DataColumn::new("name"),
                DataColumn::new("arrears"),
                DataColumn::new("months_due"),
            ],
            rows,
            "id",
        )
        .unwrap()
    }

    #[test]
    fn test_risk_band_edges() {
        assert_eq!(RiskBand::of(7.0), RiskBand::High);
        assert_eq!(RiskBand::of(6.0), RiskBand::Medium);
        assert_eq!(RiskBand::of(3.0), RiskBand::Medium);
        assert_eq!(RiskBand::of(2.0), RiskBand::Low);
        assert_eq!("HIGH".parse::<RiskBand>(), Ok(RiskBand::High));
    }

    #[test]
    fn test_risk_band_filter() {
        let high = FilterValue::Category("high".to_string());
        assert!(risk_band_filter(&DataValue::Integer(12), &high));
        assert!(!risk_band_filter(&DataValue::Integer(5), &high));

        let bogus = FilterValue::Category("critical".to_string());
        assert!(!risk_band_filter(&DataValue::Integer(12), &bogus));
    }

    #[test]
    fn test_statement_breakdown() {
        let records = arrears();
        let member = records.record(0).unwrap();
        let batch = statement_breakdown(member, NaiveDate::from_ymd_opt(2024, 12, 15).unwrap());

        assert_eq!(batch.title, "Statement of Accounts - Abdul Rahman (M-001)");
        assert_eq!(batch.rows.len(), 5);
        assert_eq!(batch.rows[0][0], DataValue::String("December 2024".to_string()));
        assert_eq!(batch.rows[4][0], DataValue::String("August 2024".to_string()));
        assert_eq!(batch.rows[0][2], DataValue::Float(1000.0));
        assert_eq!(batch.total, Some(5000.0));
        assert_eq!(batch.total_label, "TOTAL OUTSTANDING");
    }

    #[test]
    fn test_statement_crosses_year() {
        let records = arrears();
        let member = records.record(1).unwrap();
        let batch = statement_breakdown(member, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(batch.rows.len(), 12);
        assert_eq!(batch.rows[11][0], DataValue::String("January 2024".to_string()));
    }

    #[test]
    fn test_invoice_total_due() {
        let records = RecordSet::new(
            "invoices",
            vec![
                DataColumn::new("id"),
                DataColumn::new("amount"),
                DataColumn::new("arrears"),
            ],
            vec![DataRow::new(vec![
                DataValue::String("BILL-ABDUL-001".to_string()),
                DataValue::Integer(1000),
                DataValue::Integer(2000),
            ])],
            "id",
        )
        .unwrap();

        let records = with_total_due(records).unwrap();
        assert_eq!(
            records.get_value_by_name(0, "total_due"),
            Some(&DataValue::Integer(3000))
        );
    }

    #[test]
    fn test_invoice_total_due_overflow() {
        let records = RecordSet::new(
            "invoices",
            vec![
                DataColumn::new("id"),
                DataColumn::new("amount"),
                DataColumn::new("arrears"),
            ],
            vec![DataRow::new(vec![
                DataValue::String("BILL-ZAID-004".to_string()),
                DataValue::Integer(i64::MAX),
                DataValue::Integer(1),
            ])],
            "id",
        )
        .unwrap();

        let records = with_total_due(records).unwrap();
        assert_eq!(
            records.get_value_by_name(0, "total_due"),
            Some(&DataValue::Float(i64::MAX as f64 + 1.0))
        );
    }

    fn single_member(arrears: DataValue, months_due: DataValue) -> RecordSet {
        RecordSet::new(
            "arrears",
            vec![
                DataColumn::new("id"),
                DataColumn::new("name"),
                DataColumn::new("arrears"),
                DataColumn::new("months_due"),
            ],
            vec![DataRow::new(vec![
                DataValue::String("M-009".to_string()),
                DataValue::String("Ismail Bawa".to_string()),
                arrears,
                months_due,
            ])],
            "id",
        )
        .unwrap()
    }

    #[test]
    fn test_statement_rounds_fractional_months() {
        let records = single_member(DataValue::Integer(3000), DataValue::Float(2.6));
        let batch = statement_breakdown(
            records.record(0).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        );

        assert_eq!(batch.rows.len(), 3);
        let billed: f64 = batch.rows.iter().filter_map(|row| row[2].as_f64()).sum();
        assert_eq!(billed, 3000.0);
        assert_eq!(batch.total, Some(3000.0));
    }

    #[test]
    fn test_statement_months_are_bounded() {
        let records = single_member(
            DataValue::Integer(5000),
            DataValue::Integer(1_000_000_000_000),
        );
        let batch = statement_breakdown(
            records.record(0).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        );
        assert_eq!(batch.rows.len(), MAX_STATEMENT_MONTHS as usize);

        let records = single_member(DataValue::Integer(5000), DataValue::Float(-2.0));
        let batch = statement_breakdown(
            records.record(0).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        );
        assert!(batch.rows.is_empty());
        assert_eq!(batch.total, Some(5000.0));
    }

    #[test]
    fn test_arrears_columns_bind() {
        let records = arrears();
        // phone, last_paid and status are absent from this fixture
        assert!(ColumnSet::bind(arrears_columns(), &records).is_err());
    }
}
