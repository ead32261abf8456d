use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use super::{builtin_system_variables, find_system_variable, SystemVariable};
use crate::error::{Error, Result};
use crate::types::Value;

/// Process-wide system variable values.
///
/// One lock guards the whole table, so a reader always sees a value that
/// some writer stored in full.
#[derive(Debug)]
pub struct GlobalVariables {
    values: RwLock<IndexMap<String, (SystemVariable, Value)>>,
}

impl Default for GlobalVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalVariables {
    /// Table of every global-capable variable at its default value
    pub fn new() -> Self {
        let values = builtin_system_variables()
            .into_iter()
            .filter(|var| var.scope.has_global())
            .map(|var| {
                let value = var.default.clone();
                (var.name.clone(), (var, value))
            })
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn get_global(&self, name: &str) -> Option<(SystemVariable, Value)> {
        self.values.read().get(&name.to_lowercase()).cloned()
    }

    pub fn set_global(&self, name: &str, value: Value) -> Result<()> {
        let key = name.to_lowercase();
        let mut values = self.values.write();
        let Some((var, current)) = values.get_mut(&key) else {
            return Err(unknown_global(name));
        };
        if !var.dynamic {
            return Err(Error::ReadOnlyVariable(var.name.clone()));
        }
        *current = var.convert(&value)?;
        debug!(variable = %var.name, value = %current, "set global variable");
        Ok(())
    }

    /// Restore the compiled-in default
    pub fn set_global_default(&self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let mut values = self.values.write();
        let Some((var, current)) = values.get_mut(&key) else {
            return Err(unknown_global(name));
        };
        if !var.dynamic {
            return Err(Error::ReadOnlyVariable(var.name.clone()));
        }
        *current = var.default.clone();
        Ok(())
    }

    /// Copy of every variable and its current value
    pub fn snapshot(&self) -> Vec<(SystemVariable, Value)> {
        self.values.read().values().cloned().collect()
    }
}

fn unknown_global(name: &str) -> Error {
    match find_system_variable(name) {
        Some(var) => Error::WrongVariableScope {
            name: var.name,
            scope: var.scope.to_string(),
            usage: "SET GLOBAL".to_string(),
        },
        None => Error::UnknownSystemVariable(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    #[test]
    fn test_get_global_defaults() {
        let globals = GlobalVariables::new();
        let (var, value) = globals.get_global("MAX_CONNECTIONS").unwrap();
        assert_eq!(var.sql_type, SqlType::BigInt);
        assert_eq!(value, Value::Int64(151));
        assert!(globals.get_global("last_insert_id").is_none());
    }

    #[test]
    fn test_set_global() {
        let globals = GlobalVariables::new();
        globals.set_global("max_connections", Value::Int64(500)).unwrap();
        assert_eq!(globals.get_global("max_connections").unwrap().1, Value::Int64(500));

        globals.set_global_default("max_connections").unwrap();
        assert_eq!(globals.get_global("max_connections").unwrap().1, Value::Int64(151));
    }

    #[test]
    fn test_set_global_errors() {
        let globals = GlobalVariables::new();
        assert!(matches!(
            globals.set_global("nope", Value::Int64(1)),
            Err(Error::UnknownSystemVariable(_))
        ));
        assert!(matches!(
            globals.set_global("last_insert_id", Value::Int64(1)),
            Err(Error::WrongVariableScope { .. })
        ));
        assert!(matches!(
            globals.set_global("version", Value::Text("9".into())),
            Err(Error::ReadOnlyVariable(_))
        ));
        assert!(matches!(
            globals.set_global("autocommit", Value::Text("maybe".into())),
            Err(Error::InvalidVariableValue { .. })
        ));
    }
}
