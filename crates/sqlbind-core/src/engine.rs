//! Engine: owns the shared catalog state and hands out sessions

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info_span};

use crate::analyzer::{Analyzer, Scope};
use crate::error::{Diagnostic, Error, Result, Severity, Span};
use crate::plan::LogicalPlan;
use crate::planbuilder::{split_statements, PlanBuilder};
use crate::schema::Catalog;
use crate::session::{Context, Session};
use crate::types::Row;
use crate::vars::GlobalVariables;
use crate::view_registry::ViewRegistry;

/// Shared state of one server process.
///
/// Every session created here sees the same catalog, global variables and
/// views. Session variables stay with the session.
#[derive(Debug)]
pub struct Engine {
    catalog: Arc<RwLock<Catalog>>,
    globals: Arc<GlobalVariables>,
    views: Arc<ViewRegistry>,
    analyzer: Analyzer,
    builder: PlanBuilder,
    next_session_id: AtomicU32,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            globals: Arc::new(GlobalVariables::new()),
            views: Arc::new(ViewRegistry::new()),
            analyzer: Analyzer::new(),
            builder: PlanBuilder::new(),
            next_session_id: AtomicU32::new(1),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read()
    }

    pub fn catalog_mut(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write()
    }

    pub fn globals(&self) -> &Arc<GlobalVariables> {
        &self.globals
    }

    pub fn views(&self) -> &Arc<ViewRegistry> {
        &self.views
    }

    /// Open a session with its own variables
    pub fn new_session(&self, current_database: Option<String>) -> Arc<Session> {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, database = ?current_database, "opened session");
        Arc::new(Session::new(id, current_database))
    }

    /// Context for one query of `session`
    pub fn new_context(&self, session: Arc<Session>) -> Context {
        Context::new(
            session,
            Arc::clone(&self.catalog),
            Arc::clone(&self.globals),
            Arc::clone(&self.views),
        )
    }

    /// Resolve a top-level plan
    pub fn analyze(&self, ctx: &Context, plan: &LogicalPlan) -> Result<LogicalPlan> {
        self.analyzer.analyze(ctx, plan, &Scope::new())
    }

    /// Resolve `plan`, then run it
    pub fn execute(&self, ctx: &Context, plan: &LogicalPlan) -> Result<Vec<Row>> {
        let resolved = self.analyze(ctx, plan)?;
        resolved.row_iter(ctx, &Row::new())
    }

    /// Run every statement of `sql`, returning the rows of the last one
    pub fn query(&self, ctx: &Context, sql: &str) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for plan in self.builder.build(sql)? {
            rows = self.execute(ctx, &plan)?;
        }
        Ok(rows)
    }

    /// Resolve every statement of `sql`, stopping at the first error.
    ///
    /// Statements that change session or view state are executed so later
    /// statements see their effects.
    pub fn resolve_script(&self, ctx: &Context, sql: &str) -> Result<Vec<LogicalPlan>> {
        split_statements(sql)
            .into_iter()
            .map(|stmt| self.resolve_statement(ctx, stmt))
            .collect()
    }

    /// Diagnostics for every statement of `sql`.
    ///
    /// A failing statement is reported and skipped; checking continues with
    /// the next one.
    pub fn check(&self, ctx: &Context, sql: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for stmt in split_statements(sql) {
            if let Err(err) = self.resolve_statement(ctx, stmt) {
                diagnostics.push(to_diagnostic(&err, sql, stmt));
            }
        }
        diagnostics
    }

    fn resolve_statement(&self, ctx: &Context, stmt: &str) -> Result<LogicalPlan> {
        let span = info_span!("statement", session = ctx.session().id());
        let _enter = span.enter();

        let plan = self.builder.build_statement(stmt)?;
        let resolved = self.analyze(ctx, &plan)?;
        if changes_state(&resolved) {
            resolved.row_iter(ctx, &Row::new())?;
        }
        Ok(resolved)
    }
}

/// Statements whose effects later statements of a script depend on
fn changes_state(plan: &LogicalPlan) -> bool {
    matches!(
        plan,
        LogicalPlan::Set(_) | LogicalPlan::CreateView(_) | LogicalPlan::DropView(_)
    )
}

fn to_diagnostic(err: &Error, sql: &str, stmt: &str) -> Diagnostic {
    let mut diag = Diagnostic::from(err);
    if matches!(err, Error::Unsupported(_)) {
        diag.severity = Severity::Warning;
    }
    // statements are slices of the script
    let offset = (stmt.as_ptr() as usize).saturating_sub(sql.as_ptr() as usize);
    if offset + stmt.len() <= sql.len() {
        diag = diag.with_span(Span::new(offset, stmt.len()));
    }
    diag
}
