use tracing::{debug, trace};

use crate::analyzer::{get_table_aliases, Analyzer, Scope, TableAliases};
use crate::error::{Error, Result};
use crate::expression::{Expr, GetField, UnresolvedColumn};
use crate::plan::LogicalPlan;
use crate::schema::Schema;
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};

/// Bind column references to positions in the scoped input row.
///
/// The node's own input is searched first, then each enclosing scope from
/// the innermost outward. Variable references are left to
/// [`resolve_variables`](super::resolve_variables).
pub fn resolve_columns(
    _ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    let levels = scope.level_schemas()?;

    plan.transform_up(&mut |node| {
        if node.resolved() || !node.children_resolved() {
            return Ok(Transformed::no(node));
        }
        // SET targets belong to resolve_variables, stars to expand_stars
        let exprs = node.expressions();
        let skip = matches!(node, LogicalPlan::Set(_))
            || exprs.iter().any(|e| e.is_star())
            || !exprs.iter().any(|e| e.exists(is_unresolved_column));
        if skip {
            return Ok(Transformed::no(node));
        }

        let columns = ColumnScope {
            local: node.input_schema()?,
            levels: levels.clone(),
            aliases: get_table_aliases(&node, scope),
        };

        node.transform_expressions_up(&mut |expr| match expr {
            Expr::UnresolvedColumn(col) if col.variable().is_none() => {
                let field = columns.resolve(&col)?;
                trace!(column = %field.name, index = field.index, "resolved column");
                Ok(Transformed::yes(Expr::GetField(field)))
            }
            other => Ok(Transformed::no(other)),
        })
        .inspect(|t| {
            if t.transformed {
                debug!(node = t.data.node_name(), "resolved columns");
            }
        })
    })
}

fn is_unresolved_column(expr: &Expr) -> bool {
    matches!(expr, Expr::UnresolvedColumn(col) if col.variable().is_none())
}

/// Columns visible from one node
struct ColumnScope {
    local: Schema,
    /// Scope schemas, outermost first
    levels: Vec<Schema>,
    aliases: TableAliases,
}

impl ColumnScope {
    fn resolve(&self, col: &UnresolvedColumn) -> Result<GetField> {
        let display = match &col.table {
            Some(table) => format!("{}.{}", table, col.name),
            None => col.name.clone(),
        };

        if let Some(table) = &col.table {
            if !self.aliases.contains(table) {
                return Err(Error::TableNotFound(table.clone()));
            }
            self.aliases.get(table)?;
        }

        let scope_len: usize = self.levels.iter().map(Vec::len).sum();
        if let Some(field) = find_field(&self.local, col, scope_len, &display)? {
            return Ok(field);
        }

        let mut base = scope_len;
        for level in self.levels.iter().rev() {
            base -= level.len();
            if let Some(field) = find_field(level, col, base, &display)? {
                return Ok(field);
            }
        }

        Err(Error::ColumnNotFound(display))
    }
}

/// Single match of `col` in `schema`, with `offset` added to its position
fn find_field(
    schema: &Schema,
    col: &UnresolvedColumn,
    offset: usize,
    display: &str,
) -> Result<Option<GetField>> {
    let mut matches = schema.iter().enumerate().filter(|(_, c)| {
        c.name.eq_ignore_ascii_case(&col.name)
            && col
                .table
                .as_ref()
                .map_or(true, |table| c.source.eq_ignore_ascii_case(table))
    });

    let Some((i, found)) = matches.next() else {
        return Ok(None);
    };
    if matches.next().is_some() {
        return Err(Error::AmbiguousColumn(display.to_string()));
    }

    Ok(Some(GetField::new(
        offset + i,
        found.sql_type.clone(),
        &found.source,
        &found.name,
        found.nullable,
    )))
}
