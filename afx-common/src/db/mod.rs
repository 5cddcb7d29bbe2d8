//! Database helpers shared by the afx crates

pub mod schema;

pub use schema::{create_table_sql, table_exists, ColumnDefinition};
