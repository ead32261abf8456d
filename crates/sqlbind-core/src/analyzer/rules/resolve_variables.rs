use tracing::debug;

use crate::analyzer::{Analyzer, Scope};
use crate::error::{Error, Result};
use crate::expression::{Expr, SetField, SystemVar, UserVar, VariableReference, VariableScope};
use crate::plan::{LogicalPlan, Set};
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};
use crate::types::SqlType;

/// Turn `@@name`, `@@scope.name` and `@name` references into typed
/// variable expressions.
///
/// Reading a system variable requires it to exist. The target of a SET
/// assignment does not, and a bare target name means a session variable.
pub fn resolve_variables(
    ctx: &Context,
    _a: &Analyzer,
    plan: &LogicalPlan,
    _scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    plan.transform_up(&mut |node| match node {
        LogicalPlan::Set(set) => resolve_set(ctx, set),
        other => other.transform_expressions_up(&mut |expr| resolve_read(ctx, expr)),
    })
}

fn resolve_read(ctx: &Context, expr: Expr) -> Result<Transformed<Expr>> {
    let Expr::UnresolvedColumn(col) = &expr else {
        return Ok(Transformed::no(expr));
    };

    match col.variable() {
        Some(VariableReference::System {
            name,
            scope,
            specified_scope,
        }) => {
            let sql_type = match scope {
                VariableScope::Session => ctx.system_variable(&name)?.0,
                VariableScope::Global => {
                    ctx.globals()
                        .get_global(&name)
                        .ok_or_else(|| Error::UnknownSystemVariable(name.clone()))?
                        .0
                        .sql_type
                }
            };
            Ok(Transformed::yes(Expr::SystemVar(
                SystemVar::new(name.to_lowercase(), scope, sql_type)
                    .with_specified_scope(specified_scope),
            )))
        }
        Some(VariableReference::User { name }) => {
            let (sql_type, _) = ctx.session().user_variable(&name);
            Ok(Transformed::yes(Expr::UserVar(UserVar::new(name, sql_type))))
        }
        None => Ok(Transformed::no(expr)),
    }
}

fn resolve_set(ctx: &Context, set: Set) -> Result<Transformed<LogicalPlan>> {
    let mut transformed = false;
    let mut exprs = Vec::with_capacity(set.exprs.len());

    for expr in set.exprs {
        let field = match expr {
            Expr::SetField(field) => field,
            other => {
                let t = other.transform_up(&mut |e| resolve_read(ctx, e))?;
                transformed |= t.transformed;
                exprs.push(t.data);
                continue;
            }
        };

        let left = resolve_set_target(ctx, *field.left)?;
        let right = match (&left.data, *field.right) {
            // `SET sql_mode = ANSI`, `SET autocommit = ON`
            (Expr::SystemVar(_), Expr::UnresolvedColumn(col))
                if col.table.is_none() && col.variable().is_none() =>
            {
                Transformed::yes(Expr::literal(col.name))
            }
            (_, right) => right.transform_up(&mut |e| resolve_read(ctx, e))?,
        };

        transformed |= left.transformed || right.transformed;
        exprs.push(Expr::SetField(SetField {
            left: Box::new(left.data),
            right: Box::new(right.data),
        }));
    }

    if transformed {
        debug!("resolved SET targets");
    }
    Ok(Transformed::new(LogicalPlan::Set(Set::new(exprs)), transformed))
}

fn resolve_set_target(ctx: &Context, left: Expr) -> Result<Transformed<Expr>> {
    let Expr::UnresolvedColumn(col) = &left else {
        return Ok(Transformed::no(left));
    };

    let var = match col.variable() {
        Some(VariableReference::System {
            name,
            scope,
            specified_scope,
        }) => SystemVar::new(name.to_lowercase(), scope, target_type(ctx, &name, scope))
            .with_specified_scope(specified_scope),
        Some(VariableReference::User { name }) => {
            let (sql_type, _) = ctx.session().user_variable(&name);
            return Ok(Transformed::yes(Expr::UserVar(UserVar::new(name, sql_type))));
        }
        None => {
            if col.table.is_some() {
                return Err(Error::Unsupported(format!("SET target {}", left)));
            }
            let name = col.name.to_lowercase();
            let sql_type = target_type(ctx, &name, VariableScope::Session);
            SystemVar::new(name, VariableScope::Session, sql_type)
        }
    };
    Ok(Transformed::yes(Expr::SystemVar(var)))
}

/// Current type of an assignment target, `Null` if the variable is new
fn target_type(ctx: &Context, name: &str, scope: VariableScope) -> SqlType {
    match scope {
        VariableScope::Session => ctx.system_variable(name).map(|(t, _)| t).ok(),
        VariableScope::Global => ctx.globals().get_global(name).map(|(var, _)| var.sql_type),
    }
    .unwrap_or(SqlType::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_util::{context, resolved_table};
    use crate::types::Value;
    use pretty_assertions::assert_eq;

    fn run(ctx: &Context, plan: &LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        resolve_variables(ctx, &Analyzer::new(), plan, &Scope::new())
    }

    fn set_exprs(plan: LogicalPlan) -> Vec<(Expr, Expr)> {
        let LogicalPlan::Set(set) = plan else {
            panic!("expected Set");
        };
        set.exprs
            .into_iter()
            .map(|e| match e {
                Expr::SetField(f) => (*f.left, *f.right),
                other => panic!("expected SetField, got {}", other),
            })
            .collect()
    }

    #[test]
    fn test_system_variable_reads() {
        let ctx = context();
        let plan = LogicalPlan::project(
            vec![
                Expr::column("@@autocommit"),
                Expr::qualified_column("@@GLOBAL", "max_connections"),
            ],
            resolved_table(&ctx, "t"),
        );
        let LogicalPlan::Project(project) = run(&ctx, &plan).unwrap().data else {
            panic!("expected Project");
        };
        assert_eq!(
            project.exprs,
            vec![
                Expr::SystemVar(SystemVar::new("autocommit", VariableScope::Session, SqlType::Boolean)),
                Expr::SystemVar(
                    SystemVar::new("max_connections", VariableScope::Global, SqlType::BigInt)
                        .with_specified_scope(Some("global".to_string()))
                ),
            ]
        );
        assert_eq!(project.exprs[1].to_string(), "@@global.max_connections");
    }

    #[test]
    fn test_unknown_system_variable_read() {
        let ctx = context();
        let plan = LogicalPlan::project(vec![Expr::column("@@nope")], LogicalPlan::SingleRow);
        let err = run(&ctx, &plan).unwrap_err();
        assert!(matches!(err, Error::UnknownSystemVariable(name) if name == "nope"));
    }

    #[test]
    fn test_user_variable_takes_current_type() {
        let ctx = context();
        ctx.session().set_user_variable("x", Value::Int64(3));
        let plan = LogicalPlan::project(
            vec![Expr::column("@x"), Expr::column("@unset")],
            LogicalPlan::SingleRow,
        );
        let LogicalPlan::Project(project) = run(&ctx, &plan).unwrap().data else {
            panic!("expected Project");
        };
        assert_eq!(
            project.exprs,
            vec![
                Expr::UserVar(UserVar::new("x", SqlType::BigInt)),
                Expr::UserVar(UserVar::new("unset", SqlType::Null)),
            ]
        );
    }

    #[test]
    fn test_set_targets() {
        let ctx = context();
        let plan = LogicalPlan::Set(Set::new(vec![
            Expr::set_field(Expr::column("foo"), Expr::literal("bar")),
            Expr::set_field(Expr::column("autocommit"), Expr::column("OFF")),
            Expr::set_field(
                Expr::qualified_column("@@global", "max_connections"),
                Expr::Default,
            ),
            Expr::set_field(Expr::column("@u"), Expr::column("@@sql_select_limit")),
        ]));

        let result = run(&ctx, &plan).unwrap();
        assert!(result.transformed);
        assert_eq!(
            set_exprs(result.data),
            vec![
                (
                    Expr::SystemVar(SystemVar::new("foo", VariableScope::Session, SqlType::Null)),
                    Expr::literal("bar"),
                ),
                (
                    Expr::SystemVar(SystemVar::new(
                        "autocommit",
                        VariableScope::Session,
                        SqlType::Boolean
                    )),
                    Expr::literal("OFF"),
                ),
                (
                    Expr::SystemVar(
                        SystemVar::new("max_connections", VariableScope::Global, SqlType::BigInt)
                            .with_specified_scope(Some("global".to_string()))
                    ),
                    Expr::Default,
                ),
                (
                    Expr::UserVar(UserVar::new("u", SqlType::Null)),
                    Expr::SystemVar(SystemVar::new(
                        "sql_select_limit",
                        VariableScope::Session,
                        SqlType::UnsignedBigInt
                    )),
                ),
            ]
        );
    }

    #[test]
    fn test_resolved_plan_is_unchanged() {
        let ctx = context();
        let plan = LogicalPlan::Set(Set::new(vec![Expr::set_field(
            Expr::column("@@autocommit"),
            Expr::literal(0i64),
        )]));
        let once = run(&ctx, &plan).unwrap().data;
        let twice = run(&ctx, &once).unwrap();
        assert!(!twice.transformed);
        assert_eq!(twice.data, once);
    }
}
