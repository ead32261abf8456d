//! System and user variables.
mod constants;
mod global;
mod session;

use constants::*;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{SqlType, Value};

pub use global::GlobalVariables;
pub use session::{SessionVariables, UserVariables};

/// Session variables whose value is derived from the current database
pub const CHARACTER_SET_DATABASE_VAR: &str = "character_set_database";
pub const COLLATION_DATABASE_VAR: &str = "collation_database";

/// Where a system variable may be read and written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemVariableScope {
    Global,
    Session,
    Both,
}

impl SystemVariableScope {
    pub fn has_global(&self) -> bool {
        matches!(self, SystemVariableScope::Global | SystemVariableScope::Both)
    }

    pub fn has_session(&self) -> bool {
        matches!(self, SystemVariableScope::Session | SystemVariableScope::Both)
    }
}

impl std::fmt::Display for SystemVariableScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemVariableScope::Global => write!(f, "GLOBAL"),
            SystemVariableScope::Session => write!(f, "SESSION"),
            SystemVariableScope::Both => write!(f, "GLOBAL and SESSION"),
        }
    }
}

/// Definition of a system variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemVariable {
    pub name: String,
    pub scope: SystemVariableScope,
    /// Whether the variable may be changed at runtime
    pub dynamic: bool,
    pub sql_type: SqlType,
    pub default: Value,
}

impl SystemVariable {
    /// Type-check `value` against the declared type
    pub fn convert(&self, value: &Value) -> Result<Value> {
        self.sql_type
            .convert(value)
            .ok_or_else(|| Error::InvalidVariableValue {
                name: self.name.clone(),
                value: value.to_string(),
            })
    }
}

/// Compiled-in variable definition
#[derive(Debug, Clone, Copy)]
struct VarDef {
    name: &'static str,
    scope: SystemVariableScope,
    dynamic: bool,
    default: StaticValue,
}

#[derive(Debug, Clone, Copy)]
enum StaticValue {
    Int64(i64),
    UInt64(u64),
    Boolean(bool),
    Text(&'static str),
}

impl VarDef {
    fn to_variable(self) -> SystemVariable {
        let default = match self.default {
            StaticValue::Int64(v) => Value::Int64(v),
            StaticValue::UInt64(v) => Value::UInt64(v),
            StaticValue::Boolean(v) => Value::Boolean(v),
            StaticValue::Text(v) => Value::Text(v.to_string()),
        };
        SystemVariable {
            name: self.name.to_string(),
            scope: self.scope,
            dynamic: self.dynamic,
            sql_type: SqlType::of_value(&default),
            default,
        }
    }
}

/// All built-in system variables, in declaration order
pub fn builtin_system_variables() -> Vec<SystemVariable> {
    BUILTIN_VARIABLES.iter().map(|def| def.to_variable()).collect()
}

/// Look up a built-in system variable by name (case-insensitive)
pub fn find_system_variable(name: &str) -> Option<SystemVariable> {
    BUILTIN_VARIABLES
        .iter()
        .find(|def| def.name.eq_ignore_ascii_case(name))
        .map(|def| def.to_variable())
}

/// Defaults every new session starts from, keyed by lower-cased name.
///
/// Rebuilt on each call so `SET x = DEFAULT` never sees a stale copy.
pub fn default_session_config() -> IndexMap<String, (SqlType, Value)> {
    BUILTIN_VARIABLES
        .iter()
        .filter(|def| def.scope.has_session())
        .map(|def| {
            let var = def.to_variable();
            (var.name, (var.sql_type, var.default))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        let var = find_system_variable("AutoCommit").unwrap();
        assert_eq!(var.name, "autocommit");
        assert_eq!(var.sql_type, SqlType::Boolean);
        assert!(find_system_variable("no_such_thing").is_none());
    }

    #[test]
    fn test_default_session_config_skips_global_only() {
        let config = default_session_config();
        assert!(config.contains_key("sql_select_limit"));
        assert!(config.contains_key("last_insert_id"));
        assert!(!config.contains_key("max_connections"));
        assert_eq!(
            config["auto_increment_increment"],
            (SqlType::BigInt, Value::Int64(1))
        );
    }

    #[test]
    fn test_convert_rejects_wrong_type() {
        let var = find_system_variable("wait_timeout").unwrap();
        assert_eq!(var.convert(&Value::Text("60".into())).unwrap(), Value::Int64(60));
        let err = var.convert(&Value::Text("soon".into())).unwrap_err();
        assert!(matches!(err, Error::InvalidVariableValue { .. }));
    }
}
