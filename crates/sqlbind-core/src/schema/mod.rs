//! Schema management module

mod builder;
mod catalog;
mod column;

pub use builder::SchemaBuilder;
pub(crate) use builder::{object_name_to_qualified, split_sql_statements};
pub use catalog::{Catalog, ColumnDef, Database, QualifiedName, TableDef, DEFAULT_DATABASE};
pub use column::{Column, Schema};
