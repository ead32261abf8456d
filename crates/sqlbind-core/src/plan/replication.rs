//! Replication control statements
//!
//! These nodes only carry their options; the work is done by a
//! [`BinlogReplicaController`] bound before execution.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::Context;

/// Receives replication control commands
pub trait BinlogReplicaController: std::fmt::Debug + Send + Sync {
    fn set_replication_source_options(
        &self,
        ctx: &Context,
        options: &[ReplicationOption],
    ) -> Result<()>;

    fn set_replication_filter_options(
        &self,
        ctx: &Context,
        options: &[ReplicationOption],
    ) -> Result<()>;

    fn start_replica(&self, ctx: &Context) -> Result<()>;

    fn stop_replica(&self, ctx: &Context) -> Result<()>;

    /// `RESET REPLICA`, with `reset_all` for `RESET REPLICA ALL`
    fn reset_replica(&self, ctx: &Context, reset_all: bool) -> Result<()>;
}

/// Node that needs a controller to execute
pub trait BinlogReplicaControllerCommand {
    fn binlog_replica_controller(&self) -> Option<&Arc<dyn BinlogReplicaController>>;

    fn with_binlog_replica_controller(&self, controller: Arc<dyn BinlogReplicaController>)
        -> Self;
}

/// `NAME = value` in CHANGE REPLICATION SOURCE / FILTER
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicationOption {
    /// Option name, upper-cased
    pub name: String,
    /// Value text with surrounding quotes removed
    pub value: String,
}

impl ReplicationOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_uppercase(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for ReplicationOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

fn same_controller(
    a: &Option<Arc<dyn BinlogReplicaController>>,
    b: &Option<Arc<dyn BinlogReplicaController>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn controller(
    controller: &Option<Arc<dyn BinlogReplicaController>>,
) -> Result<&Arc<dyn BinlogReplicaController>> {
    controller.as_ref().ok_or(Error::NoReplicationController)
}

macro_rules! impl_replica_command {
    ($node:ident) => {
        impl BinlogReplicaControllerCommand for $node {
            fn binlog_replica_controller(&self) -> Option<&Arc<dyn BinlogReplicaController>> {
                self.controller.as_ref()
            }

            fn with_binlog_replica_controller(
                &self,
                controller: Arc<dyn BinlogReplicaController>,
            ) -> Self {
                Self {
                    controller: Some(controller),
                    ..self.clone()
                }
            }
        }

        impl PartialEq for $node {
            fn eq(&self, other: &Self) -> bool {
                self.fields_eq(other) && same_controller(&self.controller, &other.controller)
            }
        }
    };
}

/// `CHANGE REPLICATION SOURCE TO ...`
#[derive(Debug, Clone, Default)]
pub struct ChangeReplicationSource {
    pub options: Vec<ReplicationOption>,
    pub controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl ChangeReplicationSource {
    pub fn new(options: Vec<ReplicationOption>) -> Self {
        Self {
            options,
            controller: None,
        }
    }

    fn fields_eq(&self, other: &Self) -> bool {
        self.options == other.options
    }

    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        debug!(options = self.options.len(), "changing replication source");
        controller(&self.controller)?.set_replication_source_options(ctx, &self.options)
    }
}

/// `CHANGE REPLICATION FILTER ...`
#[derive(Debug, Clone, Default)]
pub struct ChangeReplicationFilter {
    pub options: Vec<ReplicationOption>,
    pub controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl ChangeReplicationFilter {
    pub fn new(options: Vec<ReplicationOption>) -> Self {
        Self {
            options,
            controller: None,
        }
    }

    fn fields_eq(&self, other: &Self) -> bool {
        self.options == other.options
    }

    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        debug!(options = self.options.len(), "changing replication filter");
        controller(&self.controller)?.set_replication_filter_options(ctx, &self.options)
    }
}

/// `START REPLICA`
#[derive(Debug, Clone, Default)]
pub struct StartReplica {
    pub controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl StartReplica {
    fn fields_eq(&self, _other: &Self) -> bool {
        true
    }

    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        controller(&self.controller)?.start_replica(ctx)
    }
}

/// `STOP REPLICA`
#[derive(Debug, Clone, Default)]
pub struct StopReplica {
    pub controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl StopReplica {
    fn fields_eq(&self, _other: &Self) -> bool {
        true
    }

    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        controller(&self.controller)?.stop_replica(ctx)
    }
}

/// `RESET REPLICA [ALL]`
#[derive(Debug, Clone, Default)]
pub struct ResetReplica {
    pub all: bool,
    pub controller: Option<Arc<dyn BinlogReplicaController>>,
}

impl ResetReplica {
    pub fn new(all: bool) -> Self {
        Self {
            all,
            controller: None,
        }
    }

    fn fields_eq(&self, other: &Self) -> bool {
        self.all == other.all
    }

    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        controller(&self.controller)?.reset_replica(ctx, self.all)
    }
}

impl_replica_command!(ChangeReplicationSource);
impl_replica_command!(ChangeReplicationFilter);
impl_replica_command!(StartReplica);
impl_replica_command!(StopReplica);
impl_replica_command!(ResetReplica);
