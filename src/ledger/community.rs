use crate::data::column::ColumnDescriptor;
use crate::data::filter::FilterKind;

pub fn donation_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id").label("Donation ID"),
        ColumnDescriptor::new("donor_name")
            .label("Donor Name")
            .filter(FilterKind::Fuzzy),
        ColumnDescriptor::new("purpose")
            .label("Fund / Purpose")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("amount")
            .label("Amount")
            .filter(FilterKind::NumberRange),
        ColumnDescriptor::new("date")
            .label("Date")
            .filter(FilterKind::DateRange),
        ColumnDescriptor::new("method")
            .label("Method")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("type")
            .label("Type")
            .filter(FilterKind::Category),
    ]
}

pub fn member_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id").label("ID"),
        ColumnDescriptor::new("name")
            .label("Name")
            .filter(FilterKind::Text),
        ColumnDescriptor::new("email")
            .label("Email")
            .filter(FilterKind::Pattern),
        ColumnDescriptor::new("role")
            .label("Role")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("status")
            .label("Status")
            .filter(FilterKind::Category),
        ColumnDescriptor::new("phone").label("Phone").unsortable(),
        ColumnDescriptor::new("joined")
            .label("Joined")
            .filter(FilterKind::DateRange),
    ]
}
