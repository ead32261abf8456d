//! Scopes for nested queries and the table aliases visible in them

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::plan::LogicalPlan;
use crate::schema::Schema;
use crate::tree::TreeNode;

/// Enclosing nodes of the subquery being resolved, outermost first
#[derive(Debug, Clone, Default)]
pub struct Scope {
    nodes: Vec<LogicalPlan>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope for a subquery found in one of `node`'s expressions
    pub fn new_scope(&self, node: &LogicalPlan) -> Scope {
        let mut nodes = self.nodes.clone();
        nodes.push(node.clone());
        Scope { nodes }
    }

    pub fn nodes(&self) -> &[LogicalPlan] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Input schema of each scope level, outermost first
    pub fn level_schemas(&self) -> Result<Vec<Schema>> {
        self.nodes.iter().map(|node| node.input_schema()).collect()
    }

    /// All scope columns, in the order they prefix a subquery row
    pub fn schema(&self) -> Result<Schema> {
        Ok(self.level_schemas()?.into_iter().flatten().collect())
    }
}

/// Lower-cased table and alias names mapped to the node providing them
#[derive(Debug, Clone, Default)]
pub struct TableAliases {
    aliases: IndexMap<String, LogicalPlan>,
    ambiguous: HashSet<String>,
}

impl TableAliases {
    /// Record a provider. A second provider of the same name keeps the
    /// later node and marks the name ambiguous.
    pub fn add(&mut self, name: &str, node: &LogicalPlan) {
        let key = name.to_lowercase();
        if self.aliases.insert(key.clone(), node.clone()).is_some() {
            self.ambiguous.insert(key);
        }
    }

    /// Node providing `name`
    pub fn get(&self, name: &str) -> Result<&LogicalPlan> {
        let key = name.to_lowercase();
        if self.ambiguous.contains(&key) {
            return Err(Error::AmbiguousTableAlias(name.to_string()));
        }
        self.aliases
            .get(&key)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Overlay an inner level; its names hide the same names outside
    fn shadow_with(&mut self, inner: TableAliases) {
        for (name, node) in inner.aliases {
            self.ambiguous.remove(&name);
            self.aliases.insert(name, node);
        }
        self.ambiguous.extend(inner.ambiguous);
    }
}

/// Table aliases visible from `node` inside `scope`
pub fn get_table_aliases(node: &LogicalPlan, scope: &Scope) -> TableAliases {
    let mut aliases = TableAliases::default();
    for level in scope.nodes().iter().chain(std::iter::once(node)) {
        let mut level_aliases = TableAliases::default();
        collect_aliases(level, &mut level_aliases);
        aliases.shadow_with(level_aliases);
    }
    aliases
}

fn collect_aliases(node: &LogicalPlan, aliases: &mut TableAliases) {
    match node {
        LogicalPlan::ResolvedTable(table) => aliases.add(table.name(), node),
        LogicalPlan::UnresolvedTable(table) => aliases.add(&table.name.name, node),
        LogicalPlan::TableAlias(alias) => aliases.add(&alias.name, node),
        LogicalPlan::SubqueryAlias(alias) => aliases.add(&alias.name, node),
        _ => {
            for child in node.children() {
                collect_aliases(child, aliases);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expr;
    use crate::schema::QualifiedName;

    fn table(name: &str) -> LogicalPlan {
        LogicalPlan::unresolved_table(QualifiedName::new(name))
    }

    #[test]
    fn test_aliases_hide_what_they_wrap() {
        let plan = LogicalPlan::project(
            vec![Expr::star()],
            LogicalPlan::cross_join(LogicalPlan::table_alias("a", table("t")), table("u")),
        );
        let aliases = get_table_aliases(&plan, &Scope::new());
        assert_eq!(aliases.len(), 2);
        assert!(aliases.contains("A"));
        assert!(aliases.contains("u"));
        assert!(!aliases.contains("t"));
    }

    #[test]
    fn test_collision_is_reported_on_lookup_only() {
        let plan = LogicalPlan::cross_join(table("t"), LogicalPlan::table_alias("T", table("u")));
        let aliases = get_table_aliases(&plan, &Scope::new());
        assert!(aliases.contains("t"));
        assert!(matches!(aliases.get("t"), Err(Error::AmbiguousTableAlias(_))));
        assert!(matches!(aliases.get("zzz"), Err(Error::TableNotFound(_))));
    }

    #[test]
    fn test_inner_level_shadows_outer() {
        let outer = LogicalPlan::project(
            vec![],
            LogicalPlan::cross_join(table("t"), LogicalPlan::table_alias("t", table("x"))),
        );
        let scope = Scope::new().new_scope(&outer);
        let inner = LogicalPlan::project(vec![], LogicalPlan::table_alias("t", table("u")));

        let aliases = get_table_aliases(&inner, &scope);
        let node = aliases.get("t").unwrap();
        assert!(matches!(
            node,
            LogicalPlan::TableAlias(alias)
                if matches!(alias.child.as_ref(), LogicalPlan::UnresolvedTable(t) if t.name.name == "u")
        ));
    }
}
