use thiserror::Error;

/// Structural problems with a record set or its column descriptors.
///
/// These are raised at construction (or refresh) time only. Runtime
/// operations on a built engine never fail; they degrade to no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Key column '{0}' not found in record set")]
    MissingKeyColumn(String),

    #[error("Row {row} has a null value in key column '{column}'")]
    NullKey { row: usize, column: String },

    #[error("Duplicate key '{key}' at rows {first} and {second}")]
    DuplicateKey {
        key: String,
        first: usize,
        second: usize,
    },

    #[error("Row {row} has {found} values but table has {expected} columns")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Column '{0}' is described but does not exist in the record set")]
    UnknownColumn(String),

    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),
}
