use tracing::debug;

use crate::analyzer::{get_table_aliases, Analyzer, Scope, TableAliases};
use crate::error::{Error, Result};
use crate::expression::{Expr, GetField};
use crate::plan::{GroupBy, LogicalPlan, Project};
use crate::schema::Schema;
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};

/// Replace `*` and `table.*` in projection lists with one field per
/// matching child column.
///
/// Nodes whose child is not resolved yet are left for a later pass.
pub fn expand_stars(
    _ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    let mut offset: Option<usize> = None;

    plan.transform_up(&mut |node| {
        if node.resolved() {
            return Ok(Transformed::no(node));
        }

        let (exprs, child) = match &node {
            LogicalPlan::Project(project) => (&project.exprs, &project.child),
            LogicalPlan::GroupBy(group_by) => (&group_by.select_exprs, &group_by.child),
            _ => return Ok(Transformed::no(node)),
        };
        if !child.resolved() || !exprs.iter().any(Expr::is_star) {
            return Ok(Transformed::no(node));
        }

        // aliases visible from this projection only, not from sibling branches
        let aliases = get_table_aliases(&node, scope);
        let offset = match offset {
            Some(offset) => offset,
            None => *offset.insert(scope.schema()?.len()),
        };
        let expanded = expand_stars_for_expressions(exprs, &child.schema()?, &aliases, offset)?;

        let node = match node {
            LogicalPlan::Project(project) => LogicalPlan::Project(Project {
                exprs: expanded,
                child: project.child,
            }),
            LogicalPlan::GroupBy(group_by) => LogicalPlan::GroupBy(GroupBy {
                select_exprs: expanded,
                grouping_exprs: group_by.grouping_exprs,
                child: group_by.child,
            }),
            other => other,
        };
        Ok(Transformed::yes(node))
    })
}

fn expand_stars_for_expressions(
    exprs: &[Expr],
    schema: &Schema,
    aliases: &TableAliases,
    offset: usize,
) -> Result<Vec<Expr>> {
    let mut expressions = Vec::with_capacity(exprs.len());

    for expr in exprs {
        let Expr::Star(star) = expr else {
            expressions.push(expr.clone());
            continue;
        };

        // only a lookup that hits a collided alias is an error here
        if let Some(table) = &star.table {
            if aliases.contains(table) {
                aliases.get(table)?;
            }
        }

        let fields: Vec<Expr> = schema
            .iter()
            .enumerate()
            .filter(|(_, col)| match &star.table {
                Some(table) => col.source.eq_ignore_ascii_case(table),
                None => true,
            })
            .map(|(i, col)| {
                Expr::GetField(GetField::new(
                    offset + i,
                    col.sql_type.clone(),
                    &col.source,
                    &col.name,
                    col.nullable,
                ))
            })
            .collect();

        if fields.is_empty() {
            if let Some(table) = &star.table {
                return Err(Error::TableNotFound(table.clone()));
            }
        }

        expressions.extend(fields);
    }

    debug!(
        expressions = %expressions.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", "),
        "resolved * to expressions"
    );
    Ok(expressions)
}
