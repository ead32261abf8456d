//! SQL analyzer module
//!
//! Drives an unresolved plan to a resolved one by running ordered batches
//! of rules, each batch until the plan stops changing.

mod rules;
mod scope;

use std::sync::Arc;

use tracing::{debug, debug_span, trace};

use crate::error::{Error, Result};
use crate::plan::{BinlogReplicaController, LogicalPlan};
use crate::session::Context;
use crate::tree::Transformed;

pub use rules::{
    bind_replica_controller, expand_stars, resolve_columns, resolve_subquery_exprs,
    resolve_tables, resolve_variables, resolve_views, validate_resolved, validate_union_schemas,
    DUAL_TABLE,
};
pub use scope::{get_table_aliases, Scope, TableAliases};

/// Iteration cap of the resolution batch
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Signature shared by all rules
pub type RuleFn =
    fn(&Context, &Analyzer, &LogicalPlan, &Scope) -> Result<Transformed<LogicalPlan>>;

/// A named rewrite of the whole plan
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl Rule {
    pub const fn new(name: &'static str, apply: RuleFn) -> Self {
        Self { name, apply }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rules run together until none of them changes the plan
#[derive(Debug, Clone)]
pub struct Batch {
    pub name: String,
    pub rules: Vec<Rule>,
    pub max_iterations: usize,
}

impl Batch {
    pub fn new(name: impl Into<String>, max_iterations: usize, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            rules,
            max_iterations,
        }
    }
}

/// The default batches, in execution order
pub fn default_batches() -> Vec<Batch> {
    vec![
        Batch::new(
            "resolution",
            DEFAULT_MAX_ITERATIONS,
            vec![
                Rule::new("resolve_views", resolve_views),
                Rule::new("resolve_tables", resolve_tables),
                Rule::new("resolve_subquery_exprs", resolve_subquery_exprs),
                Rule::new("expand_stars", expand_stars),
                Rule::new("resolve_columns", resolve_columns),
                Rule::new("resolve_variables", resolve_variables),
            ],
        ),
        Batch::new(
            "validation",
            2,
            vec![
                Rule::new("validate_union_schemas", validate_union_schemas),
                Rule::new("validate_resolved", validate_resolved),
            ],
        ),
        Batch::new(
            "finalization",
            2,
            vec![Rule::new("bind_replica_controller", bind_replica_controller)],
        ),
    ]
}

/// Rule engine
#[derive(Debug, Clone)]
pub struct Analyzer {
    batches: Vec<Batch>,
    replica_controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Controller bound into replication statements
    pub fn replica_controller(&self) -> Option<&Arc<dyn BinlogReplicaController>> {
        self.replica_controller.as_ref()
    }

    /// Run every batch over `plan`.
    ///
    /// The first rule error stops the analysis and is returned unchanged.
    pub fn analyze(&self, ctx: &Context, plan: &LogicalPlan, scope: &Scope) -> Result<LogicalPlan> {
        let mut current = plan.clone();
        for batch in &self.batches {
            current = self.run_batch(ctx, batch, current, scope)?;
        }
        Ok(current)
    }

    fn run_batch(
        &self,
        ctx: &Context,
        batch: &Batch,
        plan: LogicalPlan,
        scope: &Scope,
    ) -> Result<LogicalPlan> {
        let mut current = plan;

        for iteration in 1..=batch.max_iterations {
            trace!(batch = %batch.name, iteration, "starting batch iteration");
            let mut changed = false;

            for rule in &batch.rules {
                ctx.check_cancelled()?;

                let span = debug_span!("rule", name = rule.name, batch = %batch.name);
                let _enter = span.enter();

                let result = (rule.apply)(ctx, self, &current, scope)?;
                if result.transformed {
                    debug!(rule = rule.name, "rule changed plan");
                    changed = true;
                }
                current = result.data;
            }

            if !changed {
                return Ok(current);
            }
        }

        Err(Error::IterationCapReached {
            batch: batch.name.clone(),
            iterations: batch.max_iterations,
        })
    }
}

/// Configures an [`Analyzer`]
#[derive(Debug, Default)]
pub struct AnalyzerBuilder {
    max_iterations: Option<usize>,
    extra_batches: Vec<Batch>,
    replica_controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl AnalyzerBuilder {
    /// Override the iteration cap of the resolution batch
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Append a batch after the default ones
    pub fn add_batch(mut self, batch: Batch) -> Self {
        self.extra_batches.push(batch);
        self
    }

    pub fn with_replica_controller(mut self, controller: Arc<dyn BinlogReplicaController>) -> Self {
        self.replica_controller = Some(controller);
        self
    }

    pub fn build(self) -> Analyzer {
        let mut batches = default_batches();
        if let Some(max_iterations) = self.max_iterations {
            if let Some(resolution) = batches.first_mut() {
                resolution.max_iterations = max_iterations;
            }
        }
        batches.extend(self.extra_batches);

        Analyzer {
            batches,
            replica_controller: self.replica_controller,
        }
    }

    /// Build an analyzer running only `batches`
    pub fn build_with_batches(self, batches: Vec<Batch>) -> Analyzer {
        Analyzer {
            batches,
            replica_controller: self.replica_controller,
        }
    }
}
