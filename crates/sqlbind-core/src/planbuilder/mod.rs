//! Plan builder - turns SQL text into unresolved logical plans
//!
//! Queries, views and DROP VIEW go through `sqlparser`'s MySQL dialect.
//! SET and the replication statements are recognized here first, since
//! their MySQL forms (`@@global.x`, `DEFAULT`, replica options) are what
//! the resolver cares about.

mod query;
mod replication;
mod set;

use sqlparser::ast::{ObjectType, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::error::{Error, Result};
use crate::plan::{CreateView, DropView, LogicalPlan};
use crate::schema::{object_name_to_qualified, split_sql_statements};

/// Builds unresolved plans from SQL scripts
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanBuilder;

impl PlanBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build one plan per statement of `sql`
    pub fn build(&self, sql: &str) -> Result<Vec<LogicalPlan>> {
        split_statements(sql)
            .into_iter()
            .map(|stmt| self.build_statement(stmt))
            .collect()
    }

    /// Build the plan of a single statement
    pub fn build_statement(&self, sql: &str) -> Result<LogicalPlan> {
        let sql = sql.trim();

        if let Some(plan) = replication::build(sql) {
            debug!(node = plan.node_name(), "built replication statement");
            return Ok(plan);
        }
        if let Some(plan) = set::build(sql) {
            return plan;
        }

        let mut statements =
            Parser::parse_sql(&MySqlDialect {}, sql).map_err(|e| Error::Parse(e.to_string()))?;
        if statements.len() != 1 {
            return Err(Error::Parse(format!(
                "expected one statement, found {}",
                statements.len()
            )));
        }
        match statements.pop() {
            Some(statement) => from_statement(&statement, sql),
            None => Err(Error::Parse("empty statement".to_string())),
        }
    }
}

/// Statements of a script, with surrounding whitespace removed
pub fn split_statements(sql: &str) -> Vec<&str> {
    split_sql_statements(sql)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn from_statement(statement: &Statement, sql: &str) -> Result<LogicalPlan> {
    match statement {
        Statement::Query(query) => query::from_query(query),
        Statement::CreateView {
            or_replace,
            materialized,
            name,
            query,
            ..
        } => {
            if *materialized {
                return Err(Error::Unsupported("CREATE MATERIALIZED VIEW".to_string()));
            }
            let name = object_name_to_qualified(name);
            let definition = LogicalPlan::subquery_alias(&name.name, query::from_query(query)?);
            Ok(LogicalPlan::CreateView(CreateView {
                name,
                definition: Box::new(definition),
                text: query.to_string(),
                or_replace: *or_replace,
            }))
        }
        Statement::Drop {
            object_type: ObjectType::View,
            if_exists,
            names,
            ..
        } => Ok(LogicalPlan::DropView(DropView {
            views: names.iter().map(object_name_to_qualified).collect(),
            if_exists: *if_exists,
        })),
        _ => Err(Error::Unsupported(statement_kind(sql))),
    }
}

/// Leading keywords of a statement, for error messages
fn statement_kind(sql: &str) -> String {
    sql.split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Split on commas outside quotes and parentheses
pub(crate) fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expr;
    use crate::schema::QualifiedName;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_script() {
        let plans = PlanBuilder::new()
            .build("SELECT 1; SET @x = 2; START REPLICA;")
            .unwrap();
        let names: Vec<&str> = plans.iter().map(|p| p.node_name()).collect();
        assert_eq!(names, vec!["Project", "Set", "StartReplica"]);
    }

    #[test]
    fn test_create_view() {
        let plan = PlanBuilder::new()
            .build_statement("CREATE OR REPLACE VIEW db.v AS SELECT a FROM t")
            .unwrap();
        let LogicalPlan::CreateView(create) = plan else {
            panic!("expected CreateView");
        };
        assert_eq!(create.name, QualifiedName::with_database("db", "v"));
        assert!(create.or_replace);
        assert_eq!(create.text, "SELECT a FROM t");
        assert_eq!(
            *create.definition,
            LogicalPlan::subquery_alias(
                "v",
                LogicalPlan::project(
                    vec![Expr::column("a")],
                    LogicalPlan::unresolved_table(QualifiedName::new("t"))
                )
            )
        );
    }

    #[test]
    fn test_drop_view() {
        let plan = PlanBuilder::new()
            .build_statement("DROP VIEW IF EXISTS v1, other.v2")
            .unwrap();
        assert_eq!(
            plan,
            LogicalPlan::DropView(DropView {
                views: vec![
                    QualifiedName::new("v1"),
                    QualifiedName::with_database("other", "v2"),
                ],
                if_exists: true,
            })
        );
    }

    #[test]
    fn test_unsupported_and_parse_errors() {
        let builder = PlanBuilder::new();
        assert!(matches!(
            builder.build_statement("DELETE FROM t"),
            Err(Error::Unsupported(kind)) if kind == "DELETE FROM"
        ));
        assert!(matches!(
            builder.build_statement("SELEC 1"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a = 1, b = ',', c = (1, 2)"),
            vec!["a = 1", " b = ','", " c = (1, 2)"]
        );
    }
}
