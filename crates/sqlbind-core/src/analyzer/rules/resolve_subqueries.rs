use tracing::debug;

use crate::analyzer::{Analyzer, Scope};
use crate::error::Result;
use crate::expression::{Expr, Subquery};
use crate::plan::LogicalPlan;
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};

/// Analyze subquery expressions with the enclosing node pushed on the scope.
///
/// A node's subqueries are only analyzed once its children are resolved,
/// since the subquery may read the node's input columns.
pub fn resolve_subquery_exprs(
    ctx: &Context,
    a: &Analyzer,
    plan: &LogicalPlan,
    scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    plan.transform_up(&mut |node| {
        if !node.children_resolved() || !has_unresolved_subquery(&node) {
            return Ok(Transformed::no(node));
        }

        let inner_scope = scope.new_scope(&node);
        node.transform_expressions_up(&mut |expr| match expr {
            Expr::Subquery(sq) if !sq.query.resolved() => {
                let query = a.analyze(ctx, &sq.query, &inner_scope)?;
                debug!(depth = inner_scope.nodes().len(), "resolved subquery");
                Ok(Transformed::yes(Expr::Subquery(Subquery {
                    query: Box::new(query),
                })))
            }
            other => Ok(Transformed::no(other)),
        })
    })
}

fn has_unresolved_subquery(node: &LogicalPlan) -> bool {
    node.expressions().iter().any(|expr| {
        expr.exists(|e| matches!(e, Expr::Subquery(sq) if !sq.query.resolved()))
    })
}
