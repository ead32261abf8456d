//! Registry of views, keyed by database and view name

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::plan::LogicalPlan;

/// Lower-cased (database, view name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    database: String,
    name: String,
}

impl ViewKey {
    pub fn new(database: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            database: database.as_ref().to_lowercase(),
            name: name.as_ref().to_lowercase(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A stored view definition
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    definition: LogicalPlan,
    text_definition: String,
}

impl View {
    pub fn new(
        name: impl Into<String>,
        definition: LogicalPlan,
        text_definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            definition,
            text_definition: text_definition.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The view body as a `SubqueryAlias` node
    pub fn definition(&self) -> &LogicalPlan {
        &self.definition
    }

    pub fn text_definition(&self) -> &str {
        &self.text_definition
    }
}

/// Views of every database. Shared between sessions.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: RwLock<IndexMap<ViewKey, Arc<View>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `view` under `database`; fails if the name is taken
    pub fn register(&self, database: &str, view: View) -> Result<()> {
        let key = ViewKey::new(database, &view.name);
        let mut views = self.views.write();
        if views.contains_key(&key) {
            return Err(Error::ExistingView {
                database: database.to_string(),
                name: view.name,
            });
        }
        debug!(database = %key.database, view = %key.name, "registered view");
        views.insert(key, Arc::new(view));
        Ok(())
    }

    pub fn view(&self, database: &str, name: &str) -> Result<Arc<View>> {
        self.views
            .read()
            .get(&ViewKey::new(database, name))
            .cloned()
            .ok_or_else(|| Error::NonExistingView {
                database: database.to_string(),
                name: name.to_string(),
            })
    }

    pub fn delete(&self, database: &str, name: &str) -> Result<()> {
        self.views
            .write()
            .shift_remove(&ViewKey::new(database, name))
            .map(|_| ())
            .ok_or_else(|| Error::NonExistingView {
                database: database.to_string(),
                name: name.to_string(),
            })
    }

    /// Delete several views under one lock.
    ///
    /// With `err_if_not_exists`, a missing key fails the call before
    /// anything is removed. Otherwise missing keys are skipped.
    pub fn delete_list(&self, keys: &[ViewKey], err_if_not_exists: bool) -> Result<()> {
        let mut views = self.views.write();

        if err_if_not_exists {
            if let Some(missing) = keys.iter().find(|key| !views.contains_key(*key)) {
                return Err(Error::NonExistingView {
                    database: missing.database.clone(),
                    name: missing.name.clone(),
                });
            }
        }

        for key in keys {
            views.shift_remove(key);
        }
        Ok(())
    }

    pub fn exists(&self, database: &str, name: &str) -> bool {
        self.views.read().contains_key(&ViewKey::new(database, name))
    }

    pub fn views_in_database(&self, database: &str) -> Vec<Arc<View>> {
        let database = database.to_lowercase();
        self.views
            .read()
            .iter()
            .filter(|(key, _)| key.database == database)
            .map(|(_, view)| Arc::clone(view))
            .collect()
    }

    pub fn all_views(&self) -> Vec<Arc<View>> {
        self.views.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str) -> View {
        View::new(
            name,
            LogicalPlan::subquery_alias(name, LogicalPlan::SingleRow),
            "select 1",
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ViewRegistry::new();
        registry.register("mydb", view("v1")).unwrap();

        let found = registry.view("MYDB", "V1").unwrap();
        assert_eq!(*found, view("v1"));
        assert!(registry.exists("mydb", "v1"));
        assert!(!registry.exists("other", "v1"));
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = ViewRegistry::new();
        registry.register("mydb", view("v1")).unwrap();
        let err = registry.register("mydb", view("V1")).unwrap_err();
        assert!(matches!(err, Error::ExistingView { .. }));
    }

    #[test]
    fn test_delete() {
        let registry = ViewRegistry::new();
        registry.register("mydb", view("v1")).unwrap();
        registry.delete("mydb", "v1").unwrap();
        assert!(matches!(
            registry.view("mydb", "v1"),
            Err(Error::NonExistingView { .. })
        ));
        assert!(matches!(
            registry.delete("mydb", "v1"),
            Err(Error::NonExistingView { .. })
        ));
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let key = ViewKey::new("MyDb", "V1");
        assert_eq!(key.database(), "mydb");
        assert_eq!(key.name(), "v1");

        let registry = ViewRegistry::new();
        registry.register("mydb", view("v1")).unwrap();
        registry.delete_list(&[key], false).unwrap();
        assert!(!registry.exists("mydb", "v1"));
    }

    #[test]
    fn test_views_in_database() {
        let registry = ViewRegistry::new();
        registry.register("a", view("v1")).unwrap();
        registry.register("a", view("v2")).unwrap();
        registry.register("b", view("v3")).unwrap();

        let mut names: Vec<String> = registry
            .views_in_database("A")
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["v1", "v2"]);
        assert_eq!(registry.all_views().len(), 3);
    }
}
