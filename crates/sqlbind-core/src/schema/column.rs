//! Plan schemas

use serde::{Deserialize, Serialize};

use crate::types::SqlType;

/// One column of a plan node's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Table or alias the column comes from
    pub source: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, source: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            sql_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Same column re-tagged with a different source, as seen through an alias
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.source, self.name)
        }
    }
}

/// Ordered list of columns produced by a plan node
pub type Schema = Vec<Column>;
