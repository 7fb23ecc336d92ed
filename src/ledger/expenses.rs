use crate::data::column::ColumnDescriptor;
use crate::data::filter::FilterKind;

pub fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id").label("Expense ID"),
        ColumnDescriptor::new("date")
            .label("Date")
            .filter(FilterKind::DateRange),
        ColumnDescriptor::new("category")
            .label("Category")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("payee")
            .label("Payee")
            .filter(FilterKind::Text),
        ColumnDescriptor::new("description")
            .label("Description")
            .filter(FilterKind::Text)
            .unsortable(),
        ColumnDescriptor::new("amount")
            .label("Amount")
            .filter(FilterKind::NumberRange),
        ColumnDescriptor::new("status")
            .label("Status")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("receipt")
            .label("Receipt")
            .filter(FilterKind::Equals),
    ]
}
