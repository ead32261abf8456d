//! Analyzer rules

mod expand_stars;
mod replication;
mod resolve_columns;
mod resolve_subqueries;
mod resolve_tables;
mod resolve_variables;
mod resolve_views;
mod validation;

pub use expand_stars::expand_stars;
pub use replication::bind_replica_controller;
pub use resolve_columns::resolve_columns;
pub use resolve_subqueries::resolve_subquery_exprs;
pub use resolve_tables::{resolve_tables, DUAL_TABLE};
pub use resolve_variables::resolve_variables;
pub use resolve_views::resolve_views;
pub use validation::{validate_resolved, validate_union_schemas};

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Arc;

    use parking_lot::RwLock;

    use crate::schema::{Catalog, ColumnDef, QualifiedName, TableDef};
    use crate::session::{Context, Session};
    use crate::types::SqlType;
    use crate::vars::GlobalVariables;
    use crate::view_registry::ViewRegistry;

    /// Catalog with `mydb.t(a, b)` and `mydb.u(a, c)`
    pub fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add_table(
            TableDef::new(QualifiedName::new("t"))
                .with_column(ColumnDef::new("a", SqlType::Integer).not_null())
                .with_column(ColumnDef::new("b", SqlType::Text)),
        );
        catalog.add_table(
            TableDef::new(QualifiedName::new("u"))
                .with_column(ColumnDef::new("a", SqlType::BigInt))
                .with_column(ColumnDef::new("c", SqlType::Boolean).not_null()),
        );
        catalog
    }

    pub fn context() -> Context {
        Context::new(
            Arc::new(Session::new(1, Some("mydb".to_string()))),
            Arc::new(RwLock::new(catalog())),
            Arc::new(GlobalVariables::new()),
            Arc::new(ViewRegistry::new()),
        )
    }

    pub fn resolved_table(ctx: &Context, name: &str) -> crate::plan::LogicalPlan {
        let table = ctx
            .catalog()
            .get_table(&QualifiedName::new(name))
            .cloned()
            .unwrap();
        crate::plan::LogicalPlan::ResolvedTable(crate::plan::ResolvedTable {
            database: "mydb".to_string(),
            table: Arc::new(table),
        })
    }
}
