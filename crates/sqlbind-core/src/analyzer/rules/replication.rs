use std::sync::Arc;

use tracing::debug;

use crate::analyzer::{Analyzer, Scope};
use crate::error::Result;
use crate::plan::{BinlogReplicaControllerCommand, LogicalPlan};
use crate::session::Context;
use crate::tree::{Transformed, TreeNode};

/// Hand the analyzer's replica controller to replication statements that
/// do not have one yet
pub fn bind_replica_controller(
    _ctx: &Context,
    a: &Analyzer,
    plan: &LogicalPlan,
    _scope: &Scope,
) -> Result<Transformed<LogicalPlan>> {
    let Some(controller) = a.replica_controller() else {
        return Ok(Transformed::no(plan.clone()));
    };

    plan.transform_up(&mut |node| {
        if !node.is_replication_command() || node.binlog_replica_controller().is_some() {
            return Ok(Transformed::no(node));
        }
        debug!(node = node.node_name(), "bound replica controller");
        Ok(Transformed::yes(
            node.with_binlog_replica_controller(Arc::clone(controller)),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_util::context;
    use crate::plan::{BinlogReplicaController, ReplicationOption, ResetReplica, StartReplica};

    #[derive(Debug)]
    struct NoopController;

    impl BinlogReplicaController for NoopController {
        fn set_replication_source_options(
            &self,
            _ctx: &Context,
            _options: &[ReplicationOption],
        ) -> Result<()> {
            Ok(())
        }

        fn set_replication_filter_options(
            &self,
            _ctx: &Context,
            _options: &[ReplicationOption],
        ) -> Result<()> {
            Ok(())
        }

        fn start_replica(&self, _ctx: &Context) -> Result<()> {
            Ok(())
        }

        fn stop_replica(&self, _ctx: &Context) -> Result<()> {
            Ok(())
        }

        fn reset_replica(&self, _ctx: &Context, _reset_all: bool) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_binds_once() {
        let controller: Arc<dyn BinlogReplicaController> = Arc::new(NoopController);
        let analyzer = Analyzer::builder()
            .with_replica_controller(Arc::clone(&controller))
            .build();
        let plan = LogicalPlan::ResetReplica(ResetReplica::new(true));

        let bound = bind_replica_controller(&context(), &analyzer, &plan, &Scope::new()).unwrap();
        assert!(bound.transformed);
        let held = bound.data.binlog_replica_controller().unwrap();
        assert!(Arc::ptr_eq(held, &controller));

        let again =
            bind_replica_controller(&context(), &analyzer, &bound.data, &Scope::new()).unwrap();
        assert!(!again.transformed);
    }

    #[test]
    fn test_without_controller() {
        let plan = LogicalPlan::StartReplica(StartReplica::default());
        let result =
            bind_replica_controller(&context(), &Analyzer::new(), &plan, &Scope::new()).unwrap();
        assert!(!result.transformed);
        assert!(result.data.binlog_replica_controller().is_none());
    }

    #[test]
    fn test_other_nodes_untouched() {
        let analyzer = Analyzer::builder()
            .with_replica_controller(Arc::new(NoopController))
            .build();
        let result =
            bind_replica_controller(&context(), &analyzer, &LogicalPlan::SingleRow, &Scope::new())
                .unwrap();
        assert!(!result.transformed);
    }
}
