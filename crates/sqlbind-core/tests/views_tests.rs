// Integration tests for the view registry and view statements
use std::sync::Arc;

use sqlbind_core::error::DiagnosticKind;
use sqlbind_core::types::Value;
use sqlbind_core::{
    Catalog, Engine, Error, LogicalPlan, SchemaBuilder, View, ViewKey, ViewRegistry,
};

fn view(name: &str) -> View {
    View::new(
        name,
        LogicalPlan::subquery_alias(name, LogicalPlan::SingleRow),
        format!("SELECT 1 AS {}", name),
    )
}

#[test]
fn test_register_and_lookup() {
    let registry = ViewRegistry::new();
    registry.register("db", view("v1")).unwrap();

    let found = registry.view("DB", "V1").unwrap();
    assert_eq!(*found, view("v1"));
    assert!(Arc::ptr_eq(&found, &registry.view("db", "v1").unwrap()));

    let err = registry.register("db", view("v1")).unwrap_err();
    assert!(matches!(err, Error::ExistingView { .. }));
}

#[test]
fn test_delete_then_lookup() {
    let registry = ViewRegistry::new();
    registry.register("db", view("v1")).unwrap();
    registry.delete("db", "v1").unwrap();

    assert!(matches!(
        registry.view("db", "v1"),
        Err(Error::NonExistingView { .. })
    ));
    assert!(matches!(
        registry.delete("db", "v1"),
        Err(Error::NonExistingView { .. })
    ));
}

#[test]
fn test_delete_list_strict_is_all_or_nothing() {
    let registry = ViewRegistry::new();
    registry.register("db", view("v1")).unwrap();
    registry.register("db", view("v2")).unwrap();

    let keys = [
        ViewKey::new("db", "v1"),
        ViewKey::new("db", "missing"),
        ViewKey::new("db", "v2"),
    ];
    let err = registry.delete_list(&keys, true).unwrap_err();
    assert!(matches!(err, Error::NonExistingView { ref name, .. } if name == "missing"));
    assert!(registry.exists("db", "v1"));
    assert!(registry.exists("db", "v2"));

    registry.delete_list(&keys, false).unwrap();
    assert!(registry.all_views().is_empty());
}

#[test]
fn test_views_in_database() {
    let registry = ViewRegistry::new();
    registry.register("a", view("v1")).unwrap();
    registry.register("b", view("v2")).unwrap();
    registry.register("A", view("v3")).unwrap();

    let names: Vec<String> = registry
        .views_in_database("a")
        .iter()
        .map(|v| v.name().to_string())
        .collect();
    assert_eq!(names, vec!["v1", "v3"]);
    assert_eq!(registry.all_views().len(), 3);
}

fn setup_engine() -> Engine {
    let mut builder = SchemaBuilder::new();
    builder
        .parse("CREATE TABLE t (a INT NOT NULL, b TEXT);")
        .unwrap();
    let (catalog, _) = builder.build();
    Engine::new(catalog)
}

#[test]
fn test_view_statements() {
    let engine = setup_engine();
    let ctx = engine.new_context(engine.new_session(Some("mydb".to_string())));

    engine
        .query(&ctx, "CREATE VIEW v AS SELECT b, 'x' AS tag FROM t")
        .unwrap();
    let stored = engine.views().view("mydb", "v").unwrap();
    assert_eq!(stored.text_definition(), "SELECT b, 'x' AS tag FROM t");

    let plan = engine.resolve_script(&ctx, "SELECT v.tag FROM v").unwrap();
    assert!(plan[0].resolved());

    let err = engine
        .query(&ctx, "CREATE VIEW v AS SELECT a FROM t")
        .unwrap_err();
    assert!(matches!(err, Error::ExistingView { .. }));
    engine
        .query(&ctx, "CREATE OR REPLACE VIEW v AS SELECT a FROM t")
        .unwrap();
    assert_eq!(
        engine.views().view("mydb", "v").unwrap().text_definition(),
        "SELECT a FROM t"
    );

    let err = engine.query(&ctx, "DROP VIEW v, nope").unwrap_err();
    assert!(matches!(err, Error::NonExistingView { .. }));
    assert!(engine.views().exists("mydb", "v"));

    engine.query(&ctx, "DROP VIEW IF EXISTS v, nope").unwrap();
    assert!(!engine.views().exists("mydb", "v"));
}

#[test]
fn test_views_are_shared_between_sessions() {
    let engine = setup_engine();
    let one = engine.new_context(engine.new_session(Some("mydb".to_string())));
    let two = engine.new_context(engine.new_session(Some("mydb".to_string())));

    engine.query(&one, "CREATE VIEW v AS SELECT 7 AS n").unwrap();
    assert_eq!(
        engine.query(&two, "SELECT n FROM v").unwrap(),
        vec![vec![Value::Int64(7)]]
    );
}

#[test]
fn test_view_in_other_database() {
    let engine = Engine::new(Catalog::new());
    let ctx = engine.new_context(engine.new_session(Some("mydb".to_string())));

    let diagnostics = engine.check(
        &ctx,
        "CREATE VIEW other.v AS SELECT 1 AS n; SELECT n FROM other.v; SELECT n FROM v;",
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TableNotFound);
}

#[test]
fn test_view_inside_scalar_subquery() {
    let engine = setup_engine();
    let ctx = engine.new_context(engine.new_session(Some("mydb".to_string())));

    engine
        .query(&ctx, "CREATE VIEW v AS SELECT * FROM (SELECT 1 AS x, 2 AS y) d")
        .unwrap();

    assert_eq!(
        engine.query(&ctx, "SELECT y FROM v").unwrap(),
        vec![vec![Value::Int64(2)]]
    );
    assert_eq!(
        engine
            .query(&ctx, "SELECT (SELECT y FROM v) FROM (SELECT 10 AS p) q")
            .unwrap(),
        vec![vec![Value::Int64(2)]]
    );
    assert_eq!(
        engine
            .query(&ctx, "SELECT (SELECT (SELECT x FROM v) FROM v) FROM (SELECT 10 AS p) q")
            .unwrap(),
        vec![vec![Value::Int64(1)]]
    );
}
