//! Data layer: records, column descriptors, the table reducer and its
//! materialized views, loaders and exporters

pub mod column;
pub mod data_exporter;
pub mod data_view;
pub mod engine;
pub mod error;
pub mod filter;
pub mod loaders;
pub mod record;
pub mod reducer;
pub mod table_state;
pub mod type_inference;
pub mod value_compare;
