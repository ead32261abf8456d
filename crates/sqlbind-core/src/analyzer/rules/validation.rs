use crate::analyzer::{Analyzer, Scope};
use crate::error::{Error, Result};
use crate::expression::Expr;
use crate::plan::LogicalPlan;
use crate::session::Context;
use crate::tree::{Transformed, TreeNode, VisitRecursion};

/// Both sides of every UNION must produce the same number of columns
pub fn validate_union_schemas(
    _ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    _scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    plan.apply(&mut |node| {
        if let LogicalPlan::Union(union) = node {
            if union.left.resolved() && union.right.resolved() {
                let left = union.left.schema()?.len();
                let right = union.right.schema()?.len();
                if left != right {
                    return Err(Error::DifferentColumnCounts { left, right });
                }
            }
        }
        Ok(VisitRecursion::Continue)
    })?;
    Ok(Transformed::no(plan.clone()))
}

/// Fail unless the whole plan is resolved, naming the deepest unresolved node
pub fn validate_resolved(
    _ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    _scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    if plan.resolved() {
        return Ok(Transformed::no(plan.clone()));
    }
    Err(Error::NotResolved(first_unresolved(plan)))
}

fn first_unresolved(node: &LogicalPlan) -> String {
    if let Some(child) = node.children().into_iter().find(|c| !c.resolved()) {
        return first_unresolved(child);
    }
    match node
        .expressions()
        .into_iter()
        .find(|e| !e.resolved())
    {
        Some(Expr::Subquery(sq)) => first_unresolved(&sq.query),
        Some(expr) => format!("{} in {}", unresolved_part(expr), node.describe()),
        None => node.describe(),
    }
}

fn unresolved_part(expr: &Expr) -> String {
    match expr.children().into_iter().find(|c| !c.resolved()) {
        Some(child) => unresolved_part(child),
        None => expr.to_string(),
    }
}
