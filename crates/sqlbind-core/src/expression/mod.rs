//! Scalar expressions attached to plan nodes

mod variables;

pub use variables::{
    parse_variable_reference, SystemVar, UserVar, VariableReference, VariableScope,
};

use crate::error::{Error, Result};
use crate::plan::LogicalPlan;
use crate::session::Context;
use crate::tree::TreeNode;
use crate::types::{Collation, Row, SqlType, Value};

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Column reference not yet bound to an input position
    UnresolvedColumn(UnresolvedColumn),
    /// `*` or `table.*` in a projection list
    Star(Star),
    /// Column bound to an index of the input row
    GetField(GetField),
    Alias(Alias),
    SystemVar(SystemVar),
    UserVar(UserVar),
    /// `left = right` inside a SET statement
    SetField(SetField),
    /// The `DEFAULT` keyword on the right of a SET assignment
    Default,
    /// Scalar subquery
    Subquery(Subquery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub sql_type: SqlType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedColumn {
    pub table: Option<String>,
    pub name: String,
}

impl UnresolvedColumn {
    /// Whether this name is really a `@`/`@@` variable reference
    pub fn variable(&self) -> Option<VariableReference> {
        parse_variable_reference(self.table.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Star {
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetField {
    pub index: usize,
    pub sql_type: SqlType,
    pub source: String,
    pub name: String,
    pub nullable: bool,
}

impl GetField {
    pub fn new(
        index: usize,
        sql_type: SqlType,
        source: impl Into<String>,
        name: impl Into<String>,
        nullable: bool,
    ) -> Self {
        Self {
            index,
            sql_type,
            source: source.into(),
            name: name.into(),
            nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub expr: Box<Expr>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetField {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub query: Box<LogicalPlan>,
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        Expr::Literal(Literal {
            sql_type: SqlType::of_value(&value),
            value,
        })
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::UnresolvedColumn(UnresolvedColumn {
            table: None,
            name: name.into(),
        })
    }

    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::UnresolvedColumn(UnresolvedColumn {
            table: Some(table.into()),
            name: name.into(),
        })
    }

    pub fn star() -> Self {
        Expr::Star(Star { table: None })
    }

    pub fn qualified_star(table: impl Into<String>) -> Self {
        Expr::Star(Star {
            table: Some(table.into()),
        })
    }

    pub fn alias(expr: Expr, name: impl Into<String>) -> Self {
        Expr::Alias(Alias {
            expr: Box::new(expr),
            name: name.into(),
        })
    }

    pub fn set_field(left: Expr, right: Expr) -> Self {
        Expr::SetField(SetField {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn subquery(query: LogicalPlan) -> Self {
        Expr::Subquery(Subquery {
            query: Box::new(query),
        })
    }

    /// Whether names and types in this expression are fully bound
    pub fn resolved(&self) -> bool {
        match self {
            Expr::UnresolvedColumn(_) | Expr::Star(_) => false,
            Expr::Subquery(sq) => sq.query.resolved(),
            Expr::Alias(alias) => alias.expr.resolved(),
            Expr::SetField(field) => field.left.resolved() && field.right.resolved(),
            Expr::Literal(_)
            | Expr::GetField(_)
            | Expr::SystemVar(_)
            | Expr::UserVar(_)
            | Expr::Default => true,
        }
    }

    pub fn data_type(&self) -> SqlType {
        match self {
            Expr::Literal(lit) => lit.sql_type.clone(),
            Expr::GetField(field) => field.sql_type.clone(),
            Expr::Alias(alias) => alias.expr.data_type(),
            Expr::SystemVar(var) => var.sql_type.clone(),
            Expr::UserVar(var) => var.sql_type.clone(),
            Expr::SetField(_) => SqlType::Boolean,
            Expr::Default => SqlType::Null,
            Expr::Subquery(sq) => sq
                .query
                .schema()
                .ok()
                .and_then(|schema| schema.into_iter().next())
                .map(|col| col.sql_type)
                .unwrap_or(SqlType::Unknown),
            Expr::UnresolvedColumn(_) | Expr::Star(_) => SqlType::Unknown,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Expr::Literal(lit) => lit.value.is_null(),
            Expr::GetField(field) => field.nullable,
            Expr::Alias(alias) => alias.expr.nullable(),
            Expr::SetField(_) => false,
            _ => true,
        }
    }

    /// Output column name of this expression
    pub fn name(&self) -> String {
        match self {
            Expr::Alias(alias) => alias.name.clone(),
            Expr::GetField(field) => field.name.clone(),
            Expr::UnresolvedColumn(col) => col.name.clone(),
            other => other.to_string(),
        }
    }

    /// Table tag of the output column, empty when the value is computed
    pub fn source(&self) -> String {
        match self {
            Expr::GetField(field) => field.source.clone(),
            _ => String::new(),
        }
    }

    /// Evaluate against `row`, which holds the enclosing scopes' values
    /// followed by the node's input values.
    pub fn eval(&self, ctx: &Context, row: &Row) -> Result<Value> {
        match self {
            Expr::Literal(lit) => Ok(lit.value.clone()),
            Expr::GetField(field) => row.get(field.index).cloned().ok_or_else(|| {
                Error::FieldOutOfRange {
                    name: field.name.clone(),
                    index: field.index,
                    width: row.len(),
                }
            }),
            Expr::Alias(alias) => alias.expr.eval(ctx, row),
            Expr::SystemVar(var) => var.eval(ctx),
            Expr::UserVar(var) => var.eval(ctx),
            Expr::SetField(field) => field.right.eval(ctx, row),
            Expr::Default => Err(Error::Unsupported(
                "DEFAULT outside of a SET assignment".to_string(),
            )),
            Expr::Subquery(sq) => {
                let rows = sq.query.row_iter(ctx, row)?;
                if rows.len() > 1 {
                    return Err(Error::SubqueryReturnsMultipleRows);
                }
                Ok(rows
                    .into_iter()
                    .next()
                    .and_then(|r| r.into_iter().next())
                    .unwrap_or(Value::Null))
            }
            Expr::UnresolvedColumn(_) | Expr::Star(_) => Err(Error::NotResolved(self.to_string())),
        }
    }

    /// Collation of the produced value and how strongly it binds
    /// (0 = explicit ... 5 = ignorable).
    pub fn collation_coercibility(&self, ctx: &Context) -> (Collation, u8) {
        match self {
            Expr::SystemVar(var) => var.collation_coercibility(ctx),
            Expr::UserVar(var) => var.collation_coercibility(ctx),
            Expr::Alias(alias) => alias.expr.collation_coercibility(ctx),
            Expr::GetField(field) if field.sql_type.is_text() => {
                let collation = ctx
                    .current_database()
                    .and_then(|db| ctx.catalog().database_collation(&db))
                    .unwrap_or_default();
                (collation, 2)
            }
            Expr::Literal(lit) if lit.sql_type.is_text() => (ctx.connection_collation(), 4),
            other => other.data_type().collation_coercibility(),
        }
    }

    pub fn is_star(&self) -> bool {
        matches!(self, Expr::Star(_))
    }
}

impl TreeNode for Expr {
    fn children(&self) -> Vec<&Self> {
        match self {
            Expr::Alias(alias) => vec![alias.expr.as_ref()],
            Expr::SetField(field) => vec![field.left.as_ref(), field.right.as_ref()],
            _ => vec![],
        }
    }

    fn with_new_children(&self, children: Vec<Self>) -> Result<Self> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(Error::InvalidChildrenNumber {
                node: self.to_string(),
                got: children.len(),
                expected,
            });
        }

        let mut children = children.into_iter();
        Ok(match (self, children.next(), children.next()) {
            (Expr::Alias(alias), Some(expr), None) => Expr::Alias(Alias {
                expr: Box::new(expr),
                name: alias.name.clone(),
            }),
            (Expr::SetField(_), Some(left), Some(right)) => Expr::set_field(left, right),
            (other, _, _) => other.clone(),
        })
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(lit) => match &lit.value {
                Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
                Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
                other => write!(f, "{}", other),
            },
            Expr::UnresolvedColumn(col) => match &col.table {
                Some(table) => write!(f, "{}.{}", table, col.name),
                None => write!(f, "{}", col.name),
            },
            Expr::Star(star) => match &star.table {
                Some(table) => write!(f, "{}.*", table),
                None => write!(f, "*"),
            },
            Expr::GetField(field) => {
                if field.source.is_empty() {
                    write!(f, "{}", field.name)
                } else {
                    write!(f, "{}.{}", field.source, field.name)
                }
            }
            Expr::Alias(alias) => write!(f, "{} as {}", alias.expr, alias.name),
            Expr::SystemVar(var) => write!(f, "{}", var),
            Expr::UserVar(var) => write!(f, "{}", var),
            Expr::SetField(field) => write!(f, "{} = {}", field.left, field.right),
            Expr::Default => write!(f, "DEFAULT"),
            Expr::Subquery(_) => write!(f, "(subquery)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Transformed;

    #[test]
    fn test_resolved() {
        assert!(Expr::literal(1i64).resolved());
        assert!(!Expr::column("a").resolved());
        assert!(!Expr::alias(Expr::star(), "x").resolved());
        assert!(Expr::GetField(GetField::new(0, SqlType::Integer, "t", "a", false)).resolved());
    }

    #[test]
    fn test_display() {
        assert_eq!(Expr::qualified_star("t").to_string(), "t.*");
        assert_eq!(Expr::literal("it's").to_string(), "'it''s'");
        assert_eq!(
            Expr::alias(Expr::qualified_column("t", "a"), "x").to_string(),
            "t.a as x"
        );
    }

    #[test]
    fn test_with_new_children_arity() {
        let alias = Expr::alias(Expr::column("a"), "x");
        let err = alias
            .with_new_children(vec![Expr::column("a"), Expr::column("b")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidChildrenNumber {
                got: 2,
                expected: 1,
                ..
            }
        ));

        let err = Expr::literal(1i64)
            .with_new_children(vec![Expr::column("a")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidChildrenNumber { expected: 0, .. }));
    }

    #[test]
    fn test_transform_up_rewrites_nested() {
        let expr = Expr::alias(Expr::column("a"), "x");
        let result = expr
            .transform_up(&mut |e| match e {
                Expr::UnresolvedColumn(col) => Ok(Transformed::yes(Expr::GetField(
                    GetField::new(3, SqlType::Integer, "t", col.name, true),
                ))),
                other => Ok(Transformed::no(other)),
            })
            .unwrap();
        assert!(result.transformed);
        assert!(result.data.resolved());
        assert_eq!(result.data.name(), "x");
        assert!(!expr.resolved());
    }
}
