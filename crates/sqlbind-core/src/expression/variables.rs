//! System (`@@name`) and user (`@name`) variable references

use serde::Serialize;

use crate::error::{Error, Result};
use crate::session::Context;
use crate::types::{Collation, SqlType, Value};

/// Scope a system variable reference reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariableScope {
    Session,
    Global,
}

impl VariableScope {
    /// Parse the `@@scope.` prefix (`session`, `local`, `global`)
    pub fn parse(scope: &str) -> Option<Self> {
        match scope.to_lowercase().as_str() {
            "session" | "local" => Some(VariableScope::Session),
            "global" => Some(VariableScope::Global),
            _ => None,
        }
    }
}

/// A variable reference as written in SQL, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableReference {
    System {
        name: String,
        scope: VariableScope,
        specified_scope: Option<String>,
    },
    User {
        name: String,
    },
}

/// Recognize `@@name`, `@@scope.name` and `@name`.
///
/// `table` is the qualifier of a compound identifier, so `@@global.x`
/// arrives as `(Some("@@global"), "x")`.
pub fn parse_variable_reference(table: Option<&str>, name: &str) -> Option<VariableReference> {
    match table {
        Some(qualifier) => {
            let scope_name = qualifier.strip_prefix("@@")?;
            let scope = VariableScope::parse(scope_name)?;
            Some(VariableReference::System {
                name: name.to_string(),
                scope,
                specified_scope: Some(scope_name.to_lowercase()),
            })
        }
        None => {
            if let Some(system) = name.strip_prefix("@@") {
                if system.is_empty() {
                    return None;
                }
                Some(VariableReference::System {
                    name: system.to_string(),
                    scope: VariableScope::Session,
                    specified_scope: None,
                })
            } else {
                let user = name.strip_prefix('@')?;
                if user.is_empty() {
                    return None;
                }
                Some(VariableReference::User {
                    name: user.trim_matches(|c| c == '`' || c == '\'' || c == '"').to_string(),
                })
            }
        }
    }
}

/// Reference to a system variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemVar {
    pub name: String,
    pub scope: VariableScope,
    /// Scope as written, kept for display
    pub specified_scope: Option<String>,
    pub sql_type: SqlType,
}

impl SystemVar {
    pub fn new(name: impl Into<String>, scope: VariableScope, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            scope,
            specified_scope: None,
            sql_type,
        }
    }

    pub fn with_specified_scope(mut self, scope: Option<String>) -> Self {
        self.specified_scope = scope;
        self
    }

    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        match self.scope {
            VariableScope::Session => ctx.system_variable(&self.name).map(|(_, value)| value),
            VariableScope::Global => ctx
                .globals()
                .get_global(&self.name)
                .map(|(_, value)| value)
                .ok_or_else(|| Error::UnknownSystemVariable(self.name.clone())),
        }
    }

    pub fn collation_coercibility(&self, ctx: &Context) -> (Collation, u8) {
        if self.sql_type.is_text() {
            (ctx.connection_collation(), 3)
        } else {
            (Collation::Binary, 5)
        }
    }
}

impl std::fmt::Display for SystemVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.specified_scope {
            Some(scope) => write!(f, "@@{}.{}", scope, self.name),
            None => write!(f, "@@{}", self.name),
        }
    }
}

/// Reference to a user variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserVar {
    pub name: String,
    /// Type of the value held when the reference was resolved
    pub sql_type: SqlType,
}

impl UserVar {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }

    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        Ok(ctx.session().user_variable(&self.name).1)
    }

    pub fn collation_coercibility(&self, ctx: &Context) -> (Collation, u8) {
        if self.sql_type.is_text() {
            (ctx.connection_collation(), 2)
        } else {
            (Collation::Binary, 5)
        }
    }
}

impl std::fmt::Display for UserVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.name)
    }
}
