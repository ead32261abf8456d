//! Privilege requirements of plan nodes

use std::collections::HashSet;

use serde::Serialize;

use crate::session::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivilegeType {
    Select,
    CreateView,
    Drop,
    Super,
    ReplicationSlaveAdmin,
}

impl std::fmt::Display for PrivilegeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrivilegeType::Select => "SELECT",
            PrivilegeType::CreateView => "CREATE VIEW",
            PrivilegeType::Drop => "DROP",
            PrivilegeType::Super => "SUPER",
            PrivilegeType::ReplicationSlaveAdmin => "REPLICATION_SLAVE_ADMIN",
        };
        f.write_str(name)
    }
}

/// Privileges a node needs on one object. Empty database and table mean
/// the operation is server-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivilegedOperation {
    pub database: String,
    pub table: String,
    pub privileges: Vec<PrivilegeType>,
}

impl PrivilegedOperation {
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        privileges: impl IntoIterator<Item = PrivilegeType>,
    ) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            privileges: privileges.into_iter().collect(),
        }
    }

    pub fn global(privileges: impl IntoIterator<Item = PrivilegeType>) -> Self {
        Self::new("", "", privileges)
    }
}

/// Decides whether the session's user may perform an operation
pub trait PrivilegedOperationChecker {
    fn user_has_privileges(&self, ctx: &Context, operation: &PrivilegedOperation) -> bool;
}

/// Checker granting a fixed set of privileges on every object
#[derive(Debug, Clone, Default)]
pub struct PrivilegeSet {
    granted: HashSet<PrivilegeType>,
}

impl PrivilegeSet {
    pub fn new(granted: impl IntoIterator<Item = PrivilegeType>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    pub fn all() -> Self {
        Self::new([
            PrivilegeType::Select,
            PrivilegeType::CreateView,
            PrivilegeType::Drop,
            PrivilegeType::Super,
            PrivilegeType::ReplicationSlaveAdmin,
        ])
    }
}

impl PrivilegedOperationChecker for PrivilegeSet {
    fn user_has_privileges(&self, _ctx: &Context, operation: &PrivilegedOperation) -> bool {
        operation
            .privileges
            .iter()
            .all(|privilege| self.granted.contains(privilege))
    }
}
