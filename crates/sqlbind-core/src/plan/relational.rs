//! Table-producing and relational operators

use std::sync::Arc;

use crate::error::Result;
use crate::expression::Expr;
use crate::plan::LogicalPlan;
use crate::schema::{Column, QualifiedName, Schema, TableDef};
use crate::session::Context;
use crate::types::{Row, Value};

/// Table reference as written, not yet looked up
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedTable {
    pub name: QualifiedName,
}

/// Table bound to a catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub database: String,
    pub table: Arc<TableDef>,
}

impl ResolvedTable {
    pub fn name(&self) -> &str {
        &self.table.name.name
    }

    pub fn schema(&self) -> Schema {
        self.table.schema()
    }
}

/// `table AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct TableAlias {
    pub name: String,
    pub child: Box<LogicalPlan>,
}

/// Named derived table or view body
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryAlias {
    pub name: String,
    pub child: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossJoin {
    pub left: Box<LogicalPlan>,
    pub right: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub exprs: Vec<Expr>,
    pub child: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub select_exprs: Vec<Expr>,
    pub grouping_exprs: Vec<Expr>,
    pub child: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub left: Box<LogicalPlan>,
    pub right: Box<LogicalPlan>,
    pub distinct: bool,
}

/// Re-tag every column as coming from `source`
pub(crate) fn aliased_schema(schema: Schema, source: &str) -> Schema {
    schema.iter().map(|col| col.with_source(source)).collect()
}

/// Output schema of a projection list
pub(crate) fn expr_schema(exprs: &[Expr]) -> Schema {
    exprs
        .iter()
        .map(|expr| Column {
            name: expr.name(),
            source: expr.source(),
            sql_type: expr.data_type(),
            nullable: expr.nullable(),
        })
        .collect()
}

/// Outer scope values followed by the local input row
fn scoped_row(outer: &Row, local: &Row) -> Row {
    let mut row = Vec::with_capacity(outer.len() + local.len());
    row.extend_from_slice(outer);
    row.extend_from_slice(local);
    row
}

fn eval_all(ctx: &Context, exprs: &[Expr], row: &Row) -> Result<Row> {
    exprs.iter().map(|expr| expr.eval(ctx, row)).collect()
}

impl CrossJoin {
    pub(crate) fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Vec<Row>> {
        let left = self.left.row_iter(ctx, row)?;
        let right = self.right.row_iter(ctx, row)?;

        let mut rows = Vec::with_capacity(left.len() * right.len());
        for l in &left {
            for r in &right {
                rows.push(scoped_row(l, r));
            }
        }
        Ok(rows)
    }
}

impl Project {
    pub(crate) fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Vec<Row>> {
        self.child
            .row_iter(ctx, row)?
            .iter()
            .map(|local| eval_all(ctx, &self.exprs, &scoped_row(row, local)))
            .collect()
    }
}

impl GroupBy {
    /// One output row per distinct grouping key, computed from the first
    /// input row of that group.
    pub(crate) fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Vec<Row>> {
        let mut groups: Vec<(Vec<Value>, Row)> = Vec::new();
        for local in self.child.row_iter(ctx, row)? {
            let full = scoped_row(row, &local);
            let key = eval_all(ctx, &self.grouping_exprs, &full)?;
            if !groups.iter().any(|(existing, _)| *existing == key) {
                groups.push((key, full));
            }
        }

        groups
            .iter()
            .map(|(_, full)| eval_all(ctx, &self.select_exprs, full))
            .collect()
    }
}

impl Union {
    pub(crate) fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Vec<Row>> {
        let mut rows = self.left.row_iter(ctx, row)?;
        rows.extend(self.right.row_iter(ctx, row)?);

        if self.distinct {
            let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
            for r in rows {
                if !unique.contains(&r) {
                    unique.push(r);
                }
            }
            return Ok(unique);
        }
        Ok(rows)
    }
}
