//! Logical plan nodes

mod privileges;
mod relational;
mod replication;
mod set;
mod views;

use std::sync::Arc;

pub use privileges::{PrivilegeSet, PrivilegeType, PrivilegedOperation, PrivilegedOperationChecker};
pub use relational::{
    CrossJoin, GroupBy, Project, ResolvedTable, SubqueryAlias, TableAlias, Union, UnresolvedTable,
};
pub use replication::{
    BinlogReplicaController, BinlogReplicaControllerCommand, ChangeReplicationFilter,
    ChangeReplicationSource, ReplicationOption, ResetReplica, StartReplica, StopReplica,
};
pub use set::Set;
pub use views::{CreateView, DropView};

use relational::{aliased_schema, expr_schema};

use crate::error::{Error, Result};
use crate::expression::Expr;
use crate::schema::{QualifiedName, Schema};
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};
use crate::types::Row;

/// A logical operator. Each node owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    UnresolvedTable(UnresolvedTable),
    ResolvedTable(ResolvedTable),
    /// The `dual` table: one row, no columns
    SingleRow,
    TableAlias(TableAlias),
    SubqueryAlias(SubqueryAlias),
    CrossJoin(CrossJoin),
    Project(Project),
    GroupBy(GroupBy),
    Union(Union),
    Set(Set),
    CreateView(CreateView),
    DropView(DropView),
    ChangeReplicationSource(ChangeReplicationSource),
    ChangeReplicationFilter(ChangeReplicationFilter),
    StartReplica(StartReplica),
    StopReplica(StopReplica),
    ResetReplica(ResetReplica),
}

impl LogicalPlan {
    pub fn unresolved_table(name: QualifiedName) -> Self {
        LogicalPlan::UnresolvedTable(UnresolvedTable { name })
    }

    pub fn table_alias(name: impl Into<String>, child: LogicalPlan) -> Self {
        LogicalPlan::TableAlias(TableAlias {
            name: name.into(),
            child: Box::new(child),
        })
    }

    pub fn subquery_alias(name: impl Into<String>, child: LogicalPlan) -> Self {
        LogicalPlan::SubqueryAlias(SubqueryAlias {
            name: name.into(),
            child: Box::new(child),
        })
    }

    pub fn cross_join(left: LogicalPlan, right: LogicalPlan) -> Self {
        LogicalPlan::CrossJoin(CrossJoin {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn project(exprs: Vec<Expr>, child: LogicalPlan) -> Self {
        LogicalPlan::Project(Project {
            exprs,
            child: Box::new(child),
        })
    }

    pub fn group_by(select_exprs: Vec<Expr>, grouping_exprs: Vec<Expr>, child: LogicalPlan) -> Self {
        LogicalPlan::GroupBy(GroupBy {
            select_exprs,
            grouping_exprs,
            child: Box::new(child),
        })
    }

    pub fn union(left: LogicalPlan, right: LogicalPlan, distinct: bool) -> Self {
        LogicalPlan::Union(Union {
            left: Box::new(left),
            right: Box::new(right),
            distinct,
        })
    }

    /// Short operator name
    pub fn node_name(&self) -> &'static str {
        match self {
            LogicalPlan::UnresolvedTable(_) => "UnresolvedTable",
            LogicalPlan::ResolvedTable(_) => "ResolvedTable",
            LogicalPlan::SingleRow => "SingleRow",
            LogicalPlan::TableAlias(_) => "TableAlias",
            LogicalPlan::SubqueryAlias(_) => "SubqueryAlias",
            LogicalPlan::CrossJoin(_) => "CrossJoin",
            LogicalPlan::Project(_) => "Project",
            LogicalPlan::GroupBy(_) => "GroupBy",
            LogicalPlan::Union(_) => "Union",
            LogicalPlan::Set(_) => "Set",
            LogicalPlan::CreateView(_) => "CreateView",
            LogicalPlan::DropView(_) => "DropView",
            LogicalPlan::ChangeReplicationSource(_) => "ChangeReplicationSource",
            LogicalPlan::ChangeReplicationFilter(_) => "ChangeReplicationFilter",
            LogicalPlan::StartReplica(_) => "StartReplica",
            LogicalPlan::StopReplica(_) => "StopReplica",
            LogicalPlan::ResetReplica(_) => "ResetReplica",
        }
    }

    /// Whether every name in this node and its subtree is bound
    pub fn resolved(&self) -> bool {
        match self {
            LogicalPlan::UnresolvedTable(_) => false,
            LogicalPlan::CreateView(create) => create.definition.resolved(),
            _ => {
                self.expressions().iter().all(|expr| expr.resolved())
                    && self.children().iter().all(|child| child.resolved())
            }
        }
    }

    /// Whether all children are resolved, regardless of this node's own state
    pub fn children_resolved(&self) -> bool {
        self.children().iter().all(|child| child.resolved())
    }

    /// Output columns. Only defined once the node is resolved.
    pub fn schema(&self) -> Result<Schema> {
        if !self.resolved() {
            return Err(Error::NotResolved(self.describe()));
        }

        Ok(match self {
            LogicalPlan::ResolvedTable(table) => table.schema(),
            LogicalPlan::TableAlias(alias) => aliased_schema(alias.child.schema()?, &alias.name),
            LogicalPlan::SubqueryAlias(alias) => {
                aliased_schema(alias.child.schema()?, &alias.name)
            }
            LogicalPlan::CrossJoin(join) => {
                let mut schema = join.left.schema()?;
                schema.extend(join.right.schema()?);
                schema
            }
            LogicalPlan::Project(project) => expr_schema(&project.exprs),
            LogicalPlan::GroupBy(group_by) => expr_schema(&group_by.select_exprs),
            LogicalPlan::Union(union) => union.left.schema()?,
            _ => Schema::new(),
        })
    }

    /// Concatenated schemas of the children, i.e. what this node's
    /// expressions are evaluated against
    pub fn input_schema(&self) -> Result<Schema> {
        let mut schema = Schema::new();
        for child in self.children() {
            schema.extend(child.schema()?);
        }
        Ok(schema)
    }

    /// Expressions owned by this node (not its children)
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            LogicalPlan::Project(project) => project.exprs.iter().collect(),
            LogicalPlan::GroupBy(group_by) => group_by
                .select_exprs
                .iter()
                .chain(group_by.grouping_exprs.iter())
                .collect(),
            LogicalPlan::Set(set) => set.exprs.iter().collect(),
            _ => vec![],
        }
    }

    /// Rebuild with replacement expressions, in [`Self::expressions`] order
    pub fn with_new_expressions(&self, exprs: Vec<Expr>) -> Result<LogicalPlan> {
        let expected = self.expressions().len();
        if exprs.len() != expected {
            return Err(Error::InvalidChildrenNumber {
                node: self.node_name().to_string(),
                got: exprs.len(),
                expected,
            });
        }

        Ok(match self {
            LogicalPlan::Project(project) => LogicalPlan::Project(Project {
                exprs,
                child: project.child.clone(),
            }),
            LogicalPlan::GroupBy(group_by) => {
                let mut select_exprs = exprs;
                let grouping_exprs = select_exprs.split_off(group_by.select_exprs.len());
                LogicalPlan::GroupBy(GroupBy {
                    select_exprs,
                    grouping_exprs,
                    child: group_by.child.clone(),
                })
            }
            LogicalPlan::Set(_) => LogicalPlan::Set(Set::new(exprs)),
            other => other.clone(),
        })
    }

    /// Rewrite each expression of this node bottom-up
    pub fn transform_expressions_up<F>(&self, f: &mut F) -> Result<Transformed<LogicalPlan>>
    where
        F: FnMut(Expr) -> Result<Transformed<Expr>>,
    {
        let exprs = self.expressions();
        if exprs.is_empty() {
            return Ok(Transformed::no(self.clone()));
        }

        let mut transformed = false;
        let mut new_exprs = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let t = expr.transform_up(f)?;
            transformed |= t.transformed;
            new_exprs.push(t.data);
        }

        if transformed {
            Ok(Transformed::yes(self.with_new_expressions(new_exprs)?))
        } else {
            Ok(Transformed::no(self.clone()))
        }
    }

    /// Produce the rows of this node. `row` holds the values of the
    /// enclosing scopes and is empty for a top-level query.
    pub fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Vec<Row>> {
        match self {
            LogicalPlan::UnresolvedTable(_) => Err(Error::NotResolved(self.describe())),
            // storage is not part of this layer
            LogicalPlan::ResolvedTable(_) => Ok(vec![]),
            LogicalPlan::SingleRow => Ok(vec![Row::new()]),
            LogicalPlan::TableAlias(alias) => alias.child.row_iter(ctx, row),
            LogicalPlan::SubqueryAlias(alias) => alias.child.row_iter(ctx, row),
            LogicalPlan::CrossJoin(join) => join.row_iter(ctx, row),
            LogicalPlan::Project(project) => project.row_iter(ctx, row),
            LogicalPlan::GroupBy(group_by) => group_by.row_iter(ctx, row),
            LogicalPlan::Union(union) => union.row_iter(ctx, row),
            LogicalPlan::Set(set) => set.row_iter(ctx, row),
            LogicalPlan::CreateView(create) => create.execute(ctx).map(|_| vec![]),
            LogicalPlan::DropView(drop) => drop.execute(ctx).map(|_| vec![]),
            LogicalPlan::ChangeReplicationSource(node) => node.execute(ctx).map(|_| vec![]),
            LogicalPlan::ChangeReplicationFilter(node) => node.execute(ctx).map(|_| vec![]),
            LogicalPlan::StartReplica(node) => node.execute(ctx).map(|_| vec![]),
            LogicalPlan::StopReplica(node) => node.execute(ctx).map(|_| vec![]),
            LogicalPlan::ResetReplica(node) => node.execute(ctx).map(|_| vec![]),
        }
    }

    /// Operations this node itself needs permission for
    pub fn privileged_operations(&self, ctx: &Context) -> Vec<PrivilegedOperation> {
        let current = ctx.current_database().unwrap_or_default();
        let database_of = |name: &QualifiedName| name.database.clone().unwrap_or_else(|| current.clone());

        match self {
            LogicalPlan::ResolvedTable(table) => vec![PrivilegedOperation::new(
                &table.database,
                table.name(),
                [PrivilegeType::Select],
            )],
            LogicalPlan::CreateView(create) => vec![PrivilegedOperation::new(
                database_of(&create.name),
                &create.name.name,
                [PrivilegeType::CreateView],
            )],
            LogicalPlan::DropView(drop) => drop
                .views
                .iter()
                .map(|name| {
                    PrivilegedOperation::new(database_of(name), &name.name, [PrivilegeType::Drop])
                })
                .collect(),
            LogicalPlan::Set(set) if set.sets_global() => {
                vec![PrivilegedOperation::global([PrivilegeType::Super])]
            }
            node if node.is_replication_command() => {
                vec![PrivilegedOperation::global([PrivilegeType::ReplicationSlaveAdmin])]
            }
            _ => vec![],
        }
    }

    /// Ask `checker` about every operation in the tree, including
    /// subqueries inside expressions
    pub fn check_privileges(&self, ctx: &Context, checker: &dyn PrivilegedOperationChecker) -> bool {
        self.privileged_operations(ctx)
            .iter()
            .all(|op| checker.user_has_privileges(ctx, op))
            && self.expressions().iter().all(|expr| {
                !expr.exists(|e| match e {
                    Expr::Subquery(sq) => !sq.query.check_privileges(ctx, checker),
                    _ => false,
                })
            })
            && self
                .children()
                .iter()
                .all(|child| child.check_privileges(ctx, checker))
    }

    pub fn is_replication_command(&self) -> bool {
        matches!(
            self,
            LogicalPlan::ChangeReplicationSource(_)
                | LogicalPlan::ChangeReplicationFilter(_)
                | LogicalPlan::StartReplica(_)
                | LogicalPlan::StopReplica(_)
                | LogicalPlan::ResetReplica(_)
        )
    }

    /// One-line description of this node without its children
    pub fn describe(&self) -> String {
        fn list(exprs: &[Expr]) -> String {
            exprs
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            LogicalPlan::UnresolvedTable(table) => format!("UnresolvedTable({})", table.name),
            LogicalPlan::ResolvedTable(table) => {
                format!("ResolvedTable({}.{})", table.database, table.name())
            }
            LogicalPlan::SingleRow => "SingleRow".to_string(),
            LogicalPlan::TableAlias(alias) => format!("TableAlias({})", alias.name),
            LogicalPlan::SubqueryAlias(alias) => format!("SubqueryAlias({})", alias.name),
            LogicalPlan::CrossJoin(_) => "CrossJoin".to_string(),
            LogicalPlan::Project(project) => format!("Project({})", list(&project.exprs)),
            LogicalPlan::GroupBy(group_by) => format!(
                "GroupBy(select: [{}], group: [{}])",
                list(&group_by.select_exprs),
                list(&group_by.grouping_exprs)
            ),
            LogicalPlan::Union(union) => {
                if union.distinct {
                    "Union distinct".to_string()
                } else {
                    "Union all".to_string()
                }
            }
            LogicalPlan::Set(set) => format!("Set({})", list(&set.exprs)),
            LogicalPlan::CreateView(create) => format!("CreateView({})", create.name),
            LogicalPlan::DropView(drop) => format!(
                "DropView({})",
                drop.views
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LogicalPlan::ChangeReplicationSource(node) => format!(
                "ChangeReplicationSource({})",
                node.options
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LogicalPlan::ChangeReplicationFilter(node) => format!(
                "ChangeReplicationFilter({})",
                node.options
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LogicalPlan::StartReplica(_) => "StartReplica".to_string(),
            LogicalPlan::StopReplica(_) => "StopReplica".to_string(),
            LogicalPlan::ResetReplica(node) => {
                if node.all {
                    "ResetReplica(all)".to_string()
                } else {
                    "ResetReplica".to_string()
                }
            }
        }
    }

    /// Indented multi-line rendering of the tree
    pub fn display_indent(&self) -> IndentDisplay<'_> {
        IndentDisplay(self)
    }
}

impl TreeNode for LogicalPlan {
    fn children(&self) -> Vec<&Self> {
        match self {
            LogicalPlan::TableAlias(alias) => vec![alias.child.as_ref()],
            LogicalPlan::SubqueryAlias(alias) => vec![alias.child.as_ref()],
            LogicalPlan::CrossJoin(join) => vec![join.left.as_ref(), join.right.as_ref()],
            LogicalPlan::Project(project) => vec![project.child.as_ref()],
            LogicalPlan::GroupBy(group_by) => vec![group_by.child.as_ref()],
            LogicalPlan::Union(union) => vec![union.left.as_ref(), union.right.as_ref()],
            LogicalPlan::CreateView(create) => vec![create.definition.as_ref()],
            _ => vec![],
        }
    }

    fn with_new_children(&self, children: Vec<Self>) -> Result<Self> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(Error::InvalidChildrenNumber {
                node: self.node_name().to_string(),
                got: children.len(),
                expected,
            });
        }

        let mut children = children.into_iter().map(Box::new);
        let mut next = || children.next().ok_or_else(|| Error::InvalidChildrenNumber {
            node: self.node_name().to_string(),
            got: 0,
            expected,
        });

        Ok(match self {
            LogicalPlan::TableAlias(alias) => LogicalPlan::TableAlias(TableAlias {
                name: alias.name.clone(),
                child: next()?,
            }),
            LogicalPlan::SubqueryAlias(alias) => LogicalPlan::SubqueryAlias(SubqueryAlias {
                name: alias.name.clone(),
                child: next()?,
            }),
            LogicalPlan::CrossJoin(_) => LogicalPlan::CrossJoin(CrossJoin {
                left: next()?,
                right: next()?,
            }),
            LogicalPlan::Project(project) => LogicalPlan::Project(Project {
                exprs: project.exprs.clone(),
                child: next()?,
            }),
            LogicalPlan::GroupBy(group_by) => LogicalPlan::GroupBy(GroupBy {
                select_exprs: group_by.select_exprs.clone(),
                grouping_exprs: group_by.grouping_exprs.clone(),
                child: next()?,
            }),
            LogicalPlan::Union(union) => LogicalPlan::Union(Union {
                left: next()?,
                right: next()?,
                distinct: union.distinct,
            }),
            LogicalPlan::CreateView(create) => LogicalPlan::CreateView(CreateView {
                name: create.name.clone(),
                definition: next()?,
                text: create.text.clone(),
                or_replace: create.or_replace,
            }),
            leaf => leaf.clone(),
        })
    }
}

impl BinlogReplicaControllerCommand for LogicalPlan {
    fn binlog_replica_controller(&self) -> Option<&Arc<dyn BinlogReplicaController>> {
        match self {
            LogicalPlan::ChangeReplicationSource(node) => node.binlog_replica_controller(),
            LogicalPlan::ChangeReplicationFilter(node) => node.binlog_replica_controller(),
            LogicalPlan::StartReplica(node) => node.binlog_replica_controller(),
            LogicalPlan::StopReplica(node) => node.binlog_replica_controller(),
            LogicalPlan::ResetReplica(node) => node.binlog_replica_controller(),
            _ => None,
        }
    }

    /// Bind `controller`; nodes other than replication commands are returned as-is
    fn with_binlog_replica_controller(&self, controller: Arc<dyn BinlogReplicaController>) -> Self {
        match self {
            LogicalPlan::ChangeReplicationSource(node) => LogicalPlan::ChangeReplicationSource(
                node.with_binlog_replica_controller(controller),
            ),
            LogicalPlan::ChangeReplicationFilter(node) => LogicalPlan::ChangeReplicationFilter(
                node.with_binlog_replica_controller(controller),
            ),
            LogicalPlan::StartReplica(node) => {
                LogicalPlan::StartReplica(node.with_binlog_replica_controller(controller))
            }
            LogicalPlan::StopReplica(node) => {
                LogicalPlan::StopReplica(node.with_binlog_replica_controller(controller))
            }
            LogicalPlan::ResetReplica(node) => {
                LogicalPlan::ResetReplica(node.with_binlog_replica_controller(controller))
            }
            other => other.clone(),
        }
    }
}

/// See [`LogicalPlan::display_indent`]
pub struct IndentDisplay<'a>(&'a LogicalPlan);

impl IndentDisplay<'_> {
    fn fmt_node(
        plan: &LogicalPlan,
        depth: usize,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "{:indent$}{}", "", plan.describe(), indent = depth * 2)?;
        for child in plan.children() {
            Self::fmt_node(child, depth + 1, f)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for IndentDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Self::fmt_node(self.0, 0, f)
    }
}

impl std::fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::GetField;
    use crate::schema::{ColumnDef, TableDef};
    use crate::types::SqlType;

    fn table_t() -> LogicalPlan {
        let def = TableDef::new(QualifiedName::new("t"))
            .with_column(ColumnDef::new("a", SqlType::Integer).not_null())
            .with_column(ColumnDef::new("b", SqlType::Text));
        LogicalPlan::ResolvedTable(ResolvedTable {
            database: "mydb".to_string(),
            table: Arc::new(def),
        })
    }

    #[test]
    fn test_schema_requires_resolution() {
        let plan = LogicalPlan::project(
            vec![Expr::star()],
            LogicalPlan::unresolved_table(QualifiedName::new("t")),
        );
        assert!(!plan.resolved());
        assert!(matches!(plan.schema(), Err(Error::NotResolved(_))));
    }

    #[test]
    fn test_alias_retags_schema() {
        let plan = LogicalPlan::table_alias("x", table_t());
        let schema = plan.schema().unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.iter().all(|col| col.source == "x"));
        assert!(!schema[0].nullable);
    }

    #[test]
    fn test_cross_join_schema_concatenates() {
        let plan = LogicalPlan::cross_join(table_t(), LogicalPlan::table_alias("u", table_t()));
        let names: Vec<String> = plan.schema().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["t.a", "t.b", "u.a", "u.b"]);
    }

    #[test]
    fn test_with_new_children_arity() {
        let plan = LogicalPlan::project(vec![], table_t());
        let err = plan
            .with_new_children(vec![table_t(), table_t()])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidChildrenNumber {
                got: 2,
                expected: 1,
                ..
            }
        ));

        let err = LogicalPlan::SingleRow
            .with_new_children(vec![table_t()])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidChildrenNumber { expected: 0, .. }));

        let rebuilt = plan.with_new_children(vec![LogicalPlan::SingleRow]).unwrap();
        assert_eq!(rebuilt.children(), vec![&LogicalPlan::SingleRow]);
    }

    #[test]
    fn test_group_by_expressions_round_trip() {
        let plan = LogicalPlan::group_by(
            vec![Expr::column("a"), Expr::column("b")],
            vec![Expr::column("a")],
            table_t(),
        );
        let field = Expr::GetField(GetField::new(0, SqlType::Integer, "t", "a", false));
        let rebuilt = plan
            .with_new_expressions(vec![field.clone(), Expr::column("b"), field.clone()])
            .unwrap();
        let LogicalPlan::GroupBy(group_by) = rebuilt else {
            panic!("expected GroupBy");
        };
        assert_eq!(group_by.select_exprs.len(), 2);
        assert_eq!(group_by.grouping_exprs, vec![field]);
    }

    #[test]
    fn test_display_indent() {
        let plan = LogicalPlan::project(vec![Expr::star()], LogicalPlan::table_alias("x", table_t()));
        assert_eq!(
            plan.display_indent().to_string(),
            "Project(*)\n  TableAlias(x)\n    ResolvedTable(mydb.t)\n"
        );
    }
}
