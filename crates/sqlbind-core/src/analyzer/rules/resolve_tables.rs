use std::sync::Arc;

use tracing::debug;

use crate::analyzer::{Analyzer, Scope};
use crate::error::{Error, Result};
use crate::plan::{LogicalPlan, ResolvedTable};
use crate::schema::QualifiedName;
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};

/// Name of the one-row table used by `SELECT` without `FROM`
pub const DUAL_TABLE: &str = "dual";

/// Bind table references to catalog entries
pub fn resolve_tables(
    ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    _scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    plan.transform_up(&mut |node| {
        let LogicalPlan::UnresolvedTable(table) = &node else {
            return Ok(Transformed::no(node));
        };

        if table.name.database.is_none() && table.name.name.eq_ignore_ascii_case(DUAL_TABLE) {
            return Ok(Transformed::yes(LogicalPlan::SingleRow));
        }

        let database = ctx.database_for(&table.name)?;
        let lookup = QualifiedName::with_database(&database, &table.name.name);
        let def = ctx
            .catalog()
            .get_table(&lookup)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(table.name.to_string()))?;

        debug!(database = %database, table = %def.name.name, "resolved table");
        Ok(Transformed::yes(LogicalPlan::ResolvedTable(ResolvedTable {
            database,
            table: Arc::new(def),
        })))
    })
}
