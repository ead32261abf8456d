//! SELECT / UNION conversion

use sqlparser::ast::{
    self, GroupByExpr, Query, Select, SelectItem, SetExpr, SetOperator, SetQuantifier, TableFactor,
    UnaryOperator,
};

use crate::analyzer::DUAL_TABLE;
use crate::error::{Error, Result};
use crate::expression::Expr;
use crate::plan::LogicalPlan;
use crate::schema::{object_name_to_qualified, QualifiedName};
use crate::types::Value;

pub(super) fn from_query(query: &Query) -> Result<LogicalPlan> {
    if query.with.is_some() {
        return Err(Error::Unsupported("WITH".to_string()));
    }
    if query.order_by.is_some() {
        return Err(Error::Unsupported("ORDER BY".to_string()));
    }
    if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
        return Err(Error::Unsupported("LIMIT".to_string()));
    }
    from_set_expr(&query.body)
}

fn from_set_expr(body: &SetExpr) -> Result<LogicalPlan> {
    match body {
        SetExpr::Select(select) => from_select(select),
        SetExpr::Query(query) => from_query(query),
        SetExpr::SetOperation {
            op: SetOperator::Union,
            set_quantifier,
            left,
            right,
        } => {
            let distinct = !matches!(set_quantifier, SetQuantifier::All);
            Ok(LogicalPlan::union(
                from_set_expr(left)?,
                from_set_expr(right)?,
                distinct,
            ))
        }
        SetExpr::SetOperation { op, .. } => Err(Error::Unsupported(op.to_string())),
        other => Err(Error::Unsupported(format!("query body {}", other))),
    }
}

fn from_select(select: &Select) -> Result<LogicalPlan> {
    if select.distinct.is_some() {
        return Err(Error::Unsupported("DISTINCT".to_string()));
    }
    if select.selection.is_some() {
        return Err(Error::Unsupported("WHERE".to_string()));
    }
    if select.having.is_some() {
        return Err(Error::Unsupported("HAVING".to_string()));
    }

    let mut from: Option<LogicalPlan> = None;
    for table in &select.from {
        if !table.joins.is_empty() {
            return Err(Error::Unsupported("JOIN".to_string()));
        }
        let relation = from_table_factor(&table.relation)?;
        from = Some(match from {
            Some(left) => LogicalPlan::cross_join(left, relation),
            None => relation,
        });
    }
    let child =
        from.unwrap_or_else(|| LogicalPlan::unresolved_table(QualifiedName::new(DUAL_TABLE)));

    let projection = select
        .projection
        .iter()
        .map(from_select_item)
        .collect::<Result<Vec<_>>>()?;

    match &select.group_by {
        GroupByExpr::Expressions(exprs, _) if !exprs.is_empty() => {
            let grouping = exprs.iter().map(from_expr).collect::<Result<Vec<_>>>()?;
            Ok(LogicalPlan::group_by(projection, grouping, child))
        }
        GroupByExpr::Expressions(..) => Ok(LogicalPlan::project(projection, child)),
        GroupByExpr::All(_) => Err(Error::Unsupported("GROUP BY ALL".to_string())),
    }
}

fn from_table_factor(factor: &TableFactor) -> Result<LogicalPlan> {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let table = LogicalPlan::unresolved_table(object_name_to_qualified(name));
            Ok(match alias {
                Some(alias) => LogicalPlan::table_alias(&alias.name.value, table),
                None => table,
            })
        }
        TableFactor::Derived {
            subquery, alias, ..
        } => {
            let Some(alias) = alias else {
                return Err(Error::Parse(
                    "every derived table must have its own alias".to_string(),
                ));
            };
            Ok(LogicalPlan::subquery_alias(
                &alias.name.value,
                from_query(subquery)?,
            ))
        }
        other => Err(Error::Unsupported(format!("table factor {}", other))),
    }
}

fn from_select_item(item: &SelectItem) -> Result<Expr> {
    match item {
        SelectItem::UnnamedExpr(expr) => from_expr(expr),
        SelectItem::ExprWithAlias { expr, alias } => Ok(Expr::alias(from_expr(expr)?, &alias.value)),
        SelectItem::Wildcard(_) => Ok(Expr::star()),
        SelectItem::QualifiedWildcard(name, _) => {
            let table = name
                .0
                .last()
                .map(|ident| ident.value.clone())
                .unwrap_or_default();
            Ok(Expr::qualified_star(table))
        }
    }
}

/// Convert a scalar expression
pub(super) fn from_expr(expr: &ast::Expr) -> Result<Expr> {
    match expr {
        ast::Expr::Identifier(ident) => Ok(Expr::column(&ident.value)),
        ast::Expr::CompoundIdentifier(idents) => match idents.as_slice() {
            [.., table, column] => Ok(Expr::qualified_column(&table.value, &column.value)),
            _ => Err(Error::Unsupported(format!("identifier {}", expr))),
        },
        ast::Expr::Value(value) => Ok(Expr::literal(from_value(value)?)),
        ast::Expr::Nested(inner) => from_expr(inner),
        ast::Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => match inner.as_ref() {
            ast::Expr::Value(ast::Value::Number(n, _)) => {
                Ok(Expr::literal(parse_number(&format!("-{}", n))?))
            }
            _ => Err(Error::Unsupported(format!("expression {}", expr))),
        },
        ast::Expr::Subquery(query) => Ok(Expr::subquery(from_query(query)?)),
        other => Err(Error::Unsupported(format!("expression {}", other))),
    }
}

fn from_value(value: &ast::Value) -> Result<Value> {
    match value {
        ast::Value::Number(n, _) => parse_number(n),
        ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => {
            Ok(Value::Text(s.clone()))
        }
        ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
        ast::Value::Null => Ok(Value::Null),
        other => Err(Error::Unsupported(format!("literal {}", other))),
    }
}

fn parse_number(n: &str) -> Result<Value> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::Int64(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Value::UInt64(u));
    }
    n.parse::<f64>()
        .map(Value::Float64)
        .map_err(|_| Error::Parse(format!("invalid number {}", n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planbuilder::PlanBuilder;
    use pretty_assertions::assert_eq;

    fn build(sql: &str) -> Result<LogicalPlan> {
        PlanBuilder::new().build_statement(sql)
    }

    fn table(name: &str) -> LogicalPlan {
        LogicalPlan::unresolved_table(QualifiedName::new(name))
    }

    #[test]
    fn test_select_items() {
        let plan = build("SELECT *, x.*, a AS b, x.c, @@autocommit, @v FROM t AS x").unwrap();
        assert_eq!(
            plan,
            LogicalPlan::project(
                vec![
                    Expr::star(),
                    Expr::qualified_star("x"),
                    Expr::alias(Expr::column("a"), "b"),
                    Expr::qualified_column("x", "c"),
                    Expr::column("@@autocommit"),
                    Expr::column("@v"),
                ],
                LogicalPlan::table_alias("x", table("t")),
            )
        );
    }

    #[test]
    fn test_from_list_is_cross_join() {
        let plan = build("SELECT * FROM t, db.u, (SELECT 1) AS d").unwrap();
        assert_eq!(
            plan,
            LogicalPlan::project(
                vec![Expr::star()],
                LogicalPlan::cross_join(
                    LogicalPlan::cross_join(
                        table("t"),
                        LogicalPlan::unresolved_table(QualifiedName::with_database("db", "u"))
                    ),
                    LogicalPlan::subquery_alias(
                        "d",
                        LogicalPlan::project(vec![Expr::literal(1i64)], table(DUAL_TABLE))
                    ),
                ),
            )
        );
    }

    #[test]
    fn test_union_and_group_by() {
        let plan = build("SELECT a FROM t GROUP BY a UNION ALL SELECT -2").unwrap();
        assert_eq!(
            plan,
            LogicalPlan::union(
                LogicalPlan::group_by(vec![Expr::column("a")], vec![Expr::column("a")], table("t")),
                LogicalPlan::project(vec![Expr::literal(-2i64)], table(DUAL_TABLE)),
                false,
            )
        );

        let LogicalPlan::Union(union) = build("SELECT 1 UNION SELECT 2").unwrap() else {
            panic!("expected Union");
        };
        assert!(union.distinct);
    }

    #[test]
    fn test_scalar_subquery() {
        let plan = build("SELECT (SELECT b FROM u) FROM t").unwrap();
        let LogicalPlan::Project(project) = plan else {
            panic!("expected Project");
        };
        assert_eq!(
            project.exprs,
            vec![Expr::subquery(LogicalPlan::project(
                vec![Expr::column("b")],
                table("u")
            ))]
        );
    }

    #[test]
    fn test_literals() {
        let plan = build("SELECT 'x', 1.5, NULL, TRUE, 18446744073709551615").unwrap();
        let LogicalPlan::Project(project) = plan else {
            panic!("expected Project");
        };
        assert_eq!(
            project.exprs,
            vec![
                Expr::literal("x"),
                Expr::literal(1.5f64),
                Expr::literal(Value::Null),
                Expr::literal(true),
                Expr::literal(u64::MAX),
            ]
        );
    }

    #[test]
    fn test_unsupported_clauses() {
        for (sql, what) in [
            ("SELECT a FROM t WHERE a = 1", "WHERE"),
            ("SELECT a FROM t ORDER BY a", "ORDER BY"),
            ("SELECT a FROM t LIMIT 1", "LIMIT"),
            ("SELECT DISTINCT a FROM t", "DISTINCT"),
            ("SELECT * FROM t JOIN u ON t.a = u.a", "JOIN"),
        ] {
            assert!(
                matches!(build(sql), Err(Error::Unsupported(ref msg)) if msg == what),
                "{sql}"
            );
        }
    }
}
