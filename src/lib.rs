pub mod config;
pub mod data;
pub mod ledger;
pub mod utils;
