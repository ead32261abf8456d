use tracing::debug;

use crate::analyzer::{Analyzer, Scope};
use crate::error::Result;
use crate::expression::{Expr, GetField, Subquery};
use crate::plan::LogicalPlan;
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};

/// Replace table references that name a registered view with the view body.
///
/// View bodies are stored resolved against an empty scope, so inside a
/// subquery their fields are moved past the scope columns.
pub fn resolve_views(
    ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    let mut offset: Option<usize> = None;

    plan.transform_up(&mut |node| {
        let LogicalPlan::UnresolvedTable(table) = &node else {
            return Ok(Transformed::no(node));
        };
        let Some(database) = table.name.database.clone().or_else(|| ctx.current_database()) else {
            return Ok(Transformed::no(node));
        };

        match ctx.views().view(&database, &table.name.name) {
            Ok(view) => {
                let offset = match offset {
                    Some(offset) => offset,
                    None => *offset.insert(scope.schema()?.len()),
                };
                debug!(database = %database, view = %view.name(), offset, "resolved view");
                Ok(Transformed::yes(shift_fields(view.definition(), offset)?))
            }
            Err(_) => Ok(Transformed::no(node)),
        }
    })
}

/// Add `by` to every field index in `plan`, subqueries included
fn shift_fields(plan: &LogicalPlan, by: usize) -> Result<LogicalPlan> {
    if by == 0 {
        return Ok(plan.clone());
    }
    let shifted = plan.transform_up(&mut |node| {
        node.transform_expressions_up(&mut |expr| match expr {
            Expr::GetField(field) => Ok(Transformed::yes(Expr::GetField(GetField {
                index: field.index + by,
                ..field
            }))),
            Expr::Subquery(sq) => Ok(Transformed::yes(Expr::Subquery(Subquery {
                query: Box::new(shift_fields(&sq.query, by)?),
            }))),
            other => Ok(Transformed::no(other)),
        })
    })?;
    Ok(shifted.data)
}
