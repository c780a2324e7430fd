//! Parse a restricted SQL DDL subset into a schema model and generate fake
//! multi-table data that honours its keys, foreign keys and enum checks.

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod preload;
pub mod schema;
pub mod synth;
pub mod value;
