//! `SET` statements

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use super::query::from_expr;
use super::split_top_level;
use crate::error::{Error, Result};
use crate::expression::Expr;
use crate::plan::{LogicalPlan, Set};

static SET_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^SET\s+(.+)$").expect("valid regex"));

static BARE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Forms of SET that do not assign variables
const UNSUPPORTED_FORMS: &[&str] = &[
    "NAMES",
    "CHARACTER",
    "CHARSET",
    "TRANSACTION",
    "PASSWORD",
    "ROLE",
    "PERSIST",
    "PERSIST_ONLY",
];

/// Build a `Set` plan if `sql` is a SET statement
pub(super) fn build(sql: &str) -> Option<Result<LogicalPlan>> {
    let caps = SET_STATEMENT.captures(sql)?;
    Some(build_assignments(&caps[1]))
}

fn build_assignments(body: &str) -> Result<LogicalPlan> {
    let first = body
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase();
    if UNSUPPORTED_FORMS.contains(&first.as_str()) {
        return Err(Error::Unsupported(format!("SET {}", first)));
    }

    let exprs = split_top_level(body)
        .into_iter()
        .map(build_assignment)
        .collect::<Result<Vec<_>>>()?;
    debug!(assignments = exprs.len(), "built SET statement");
    Ok(LogicalPlan::Set(Set::new(exprs)))
}

fn build_assignment(assignment: &str) -> Result<Expr> {
    let Some((left, right)) = assignment.split_once('=') else {
        return Err(Error::Parse(format!(
            "expected an assignment, found '{}'",
            assignment.trim()
        )));
    };
    let left = left.trim().trim_end_matches(':').trim();
    Ok(Expr::set_field(build_target(left)?, build_value(right.trim())?))
}

/// `[GLOBAL|SESSION|LOCAL] name`, `@@[scope.]name` or `@name`
fn build_target(left: &str) -> Result<Expr> {
    let mut words = left.split_whitespace();
    let (scope, name) = match (words.next(), words.next(), words.next()) {
        (Some(name), None, None) => (None, name),
        (Some(scope), Some(name), None) => (Some(scope.to_lowercase()), name),
        _ => return Err(Error::Parse(format!("invalid SET target '{}'", left))),
    };

    match scope.as_deref() {
        None => {
            if let Some((qualifier, name)) = name.split_once('.') {
                if qualifier.starts_with("@@") {
                    return Ok(Expr::qualified_column(qualifier, unquote(name)));
                }
            }
            if name.starts_with('@') {
                return Ok(Expr::column(name));
            }
            Ok(Expr::column(unquote(name)))
        }
        Some(scope @ ("global" | "session" | "local")) => {
            Ok(Expr::qualified_column(format!("@@{}", scope), unquote(name)))
        }
        Some(other) => Err(Error::Unsupported(format!("SET {}", other.to_uppercase()))),
    }
}

fn build_value(right: &str) -> Result<Expr> {
    if right.eq_ignore_ascii_case("DEFAULT") {
        return Ok(Expr::Default);
    }
    // `ON`, `ANSI`, ... name a value rather than a column
    if BARE_WORD.is_match(right)
        && !["TRUE", "FALSE", "NULL"].contains(&right.to_uppercase().as_str())
    {
        return Ok(Expr::column(right));
    }

    let expr = Parser::new(&MySqlDialect {})
        .try_with_sql(right)
        .and_then(|mut parser| parser.parse_expr())
        .map_err(|e| Error::Parse(e.to_string()))?;
    from_expr(&expr)
}

fn unquote(name: &str) -> &str {
    name.trim_matches('`')
}
