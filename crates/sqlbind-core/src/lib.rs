//! sqlbind-core: semantic resolution for MySQL-flavoured SQL
//!
//! Turns unresolved logical plans into resolved ones against a catalog,
//! session and global variables and a view registry, by running ordered
//! batches of analyzer rules to a fixed point.

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod expression;
pub mod plan;
pub mod planbuilder;
pub mod schema;
pub mod session;
pub mod tree;
pub mod types;
pub mod vars;
pub mod view_registry;

pub use analyzer::{Analyzer, AnalyzerBuilder, Batch, Rule, Scope};
pub use engine::Engine;
pub use error::{Diagnostic, DiagnosticKind, Error, Result, Severity, Span};
pub use expression::Expr;
pub use plan::LogicalPlan;
pub use planbuilder::PlanBuilder;
pub use schema::{Catalog, ColumnDef, QualifiedName, Schema, SchemaBuilder, TableDef};
pub use session::{Context, Session};
pub use tree::{Transformed, TreeNode};
pub use types::{SqlType, Value};
pub use vars::GlobalVariables;
pub use view_registry::{View, ViewKey, ViewRegistry};
