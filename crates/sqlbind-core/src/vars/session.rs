use indexmap::IndexMap;
use tracing::debug;

use super::{default_session_config, find_system_variable};
use crate::error::{Error, Result};
use crate::types::{SqlType, Value};

/// System variable values owned by one session
#[derive(Debug, Clone)]
pub struct SessionVariables {
    values: IndexMap<String, (SqlType, Value)>,
}

impl Default for SessionVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionVariables {
    pub fn new() -> Self {
        Self {
            values: default_session_config(),
        }
    }

    pub fn get(&self, name: &str) -> Option<(SqlType, Value)> {
        self.values.get(&name.to_lowercase()).cloned()
    }

    /// Set a variable. Built-in variables are type-checked, any other name
    /// is stored with the type of the value.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let key = name.to_lowercase();
        let entry = match find_system_variable(&key) {
            Some(var) => {
                if !var.scope.has_session() {
                    return Err(Error::WrongVariableScope {
                        name: var.name,
                        scope: var.scope.to_string(),
                        usage: "SET SESSION".to_string(),
                    });
                }
                if !var.dynamic {
                    return Err(Error::ReadOnlyVariable(var.name));
                }
                let value = var.convert(&value)?;
                (var.sql_type, value)
            }
            None => (SqlType::of_value(&value), value),
        };
        debug!(variable = %key, value = %entry.1, "set session variable");
        self.values.insert(key, entry);
        Ok(())
    }

    /// Reset to the compiled-in default
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let Some(default) = default_session_config().shift_remove(&key) else {
            return Err(Error::UnknownSystemVariable(name.to_string()));
        };
        self.values.insert(key, default);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &(SqlType, Value))> {
        self.values.iter()
    }
}

/// `@name` variables owned by one session
#[derive(Debug, Clone, Default)]
pub struct UserVariables {
    values: IndexMap<String, (SqlType, Value)>,
}

impl UserVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current type and value; `(Null, Null)` for a variable never assigned
    pub fn get(&self, name: &str) -> (SqlType, Value) {
        self.values
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or((SqlType::Null, Value::Null))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        let sql_type = SqlType::of_value(&value);
        self.values.insert(name.to_lowercase(), (sql_type, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &(SqlType, Value))> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_unknown_session_variable() {
        let mut vars = SessionVariables::new();
        vars.set("foo", Value::Text("bar".into())).unwrap();
        assert_eq!(
            vars.get("FOO"),
            Some((SqlType::LongText, Value::Text("bar".into())))
        );

        vars.set("baz", Value::Int64(1)).unwrap();
        assert_eq!(vars.get("baz"), Some((SqlType::BigInt, Value::Int64(1))));
    }

    #[test]
    fn test_set_then_default() {
        let defaults = default_session_config();
        let mut vars = SessionVariables::new();

        vars.set("auto_increment_increment", Value::Int64(123)).unwrap();
        vars.set("sql_select_limit", Value::Int64(1)).unwrap();
        assert_eq!(
            vars.get("sql_select_limit"),
            Some((SqlType::UnsignedBigInt, Value::UInt64(1)))
        );

        vars.set_default("auto_increment_increment").unwrap();
        vars.set_default("sql_select_limit").unwrap();
        assert_eq!(
            vars.get("auto_increment_increment").as_ref(),
            defaults.get("auto_increment_increment")
        );
        assert_eq!(
            vars.get("sql_select_limit").as_ref(),
            defaults.get("sql_select_limit")
        );
    }

    #[test]
    fn test_set_default_unknown() {
        let mut vars = SessionVariables::new();
        assert!(matches!(
            vars.set_default("foo"),
            Err(Error::UnknownSystemVariable(_))
        ));
    }

    #[test]
    fn test_session_scope_errors() {
        let mut vars = SessionVariables::new();
        assert!(matches!(
            vars.set("max_connections", Value::Int64(1)),
            Err(Error::WrongVariableScope { .. })
        ));
        assert!(matches!(
            vars.set("autocommit", Value::Int64(7)),
            Err(Error::InvalidVariableValue { .. })
        ));
    }

    #[test]
    fn test_user_variables() {
        let mut vars = UserVariables::new();
        assert_eq!(vars.get("x"), (SqlType::Null, Value::Null));

        vars.set("X", Value::Int64(3));
        assert_eq!(vars.get("x"), (SqlType::BigInt, Value::Int64(3)));

        vars.set("x", Value::Text("later".into()));
        assert_eq!(vars.get("x").0, SqlType::LongText);
    }
}
