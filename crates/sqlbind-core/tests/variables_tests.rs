// Integration tests for system and user variables
use std::thread;

use pretty_assertions::assert_eq;
use sqlbind_core::types::{SqlType, Value};
use sqlbind_core::vars::default_session_config;
use sqlbind_core::{Catalog, Context, Engine, Error, GlobalVariables};

fn setup() -> (Engine, Context) {
    let engine = Engine::new(Catalog::new());
    let ctx = engine.new_context(engine.new_session(Some("mydb".to_string())));
    (engine, ctx)
}

#[test]
fn test_session_variable_round_trip() {
    let (engine, ctx) = setup();

    engine.query(&ctx, "SET @@foo = 'bar'").unwrap();
    assert_eq!(
        ctx.system_variable("foo").unwrap(),
        (SqlType::LongText, Value::Text("bar".into()))
    );

    engine.query(&ctx, "SET @@baz = 1").unwrap();
    assert_eq!(
        ctx.system_variable("baz").unwrap(),
        (SqlType::BigInt, Value::Int64(1))
    );

    assert_eq!(
        engine.query(&ctx, "SELECT @@foo, @@session.baz").unwrap(),
        vec![vec![Value::Text("bar".into()), Value::Int64(1)]]
    );
}

#[test]
fn test_default_restores_compiled_in_value() {
    let (engine, ctx) = setup();
    let defaults = default_session_config();

    engine
        .query(&ctx, "SET autocommit = 0, wait_timeout = 60")
        .unwrap();
    assert_eq!(
        ctx.system_variable("autocommit").unwrap().1,
        Value::Boolean(false)
    );

    engine
        .query(&ctx, "SET @@autocommit = DEFAULT, SESSION wait_timeout = DEFAULT")
        .unwrap();
    assert_eq!(
        ctx.system_variable("autocommit").unwrap(),
        defaults["autocommit"]
    );
    assert_eq!(
        ctx.system_variable("wait_timeout").unwrap(),
        defaults["wait_timeout"]
    );
}

#[test]
fn test_bare_word_values() {
    let (engine, ctx) = setup();

    engine.query(&ctx, "SET autocommit = OFF").unwrap();
    assert_eq!(
        ctx.system_variable("autocommit").unwrap().1,
        Value::Boolean(false)
    );
}

#[test]
fn test_invalid_assignments() {
    let (engine, ctx) = setup();

    let err = engine.query(&ctx, "SET autocommit = 'maybe'").unwrap_err();
    assert!(matches!(err, Error::InvalidVariableValue { .. }));

    let err = engine.query(&ctx, "SET @@global.version = 'x'").unwrap_err();
    assert!(matches!(err, Error::ReadOnlyVariable(_)));

    let err = engine.query(&ctx, "SET max_connections = 1").unwrap_err();
    assert!(matches!(err, Error::WrongVariableScope { .. }));

    let err = engine.query(&ctx, "SELECT @@no_such_variable").unwrap_err();
    assert!(matches!(err, Error::UnknownSystemVariable(_)));
}

#[test]
fn test_user_variables() {
    let (engine, ctx) = setup();

    assert_eq!(
        engine.query(&ctx, "SELECT @unset").unwrap(),
        vec![vec![Value::Null]]
    );

    engine.query(&ctx, "SET @a = 'x', @b := 2.5").unwrap();
    assert_eq!(
        ctx.session().user_variable("a"),
        (SqlType::LongText, Value::Text("x".into()))
    );
    assert_eq!(
        ctx.session().user_variable("b"),
        (SqlType::DoublePrecision, Value::Float64(2.5))
    );

    let err = engine.query(&ctx, "SET @a = DEFAULT").unwrap_err();
    assert!(matches!(err, Error::InvalidVariableValue { .. }));
}

#[test]
fn test_database_variables_follow_use() {
    let mut catalog = Catalog::new();
    catalog.get_or_create_database("legacy").collation =
        sqlbind_core::types::Collation::Latin1_swedish_ci;
    let engine = Engine::new(catalog);
    let ctx = engine.new_context(engine.new_session(Some("legacy".to_string())));

    assert_eq!(
        engine.query(&ctx, "SELECT @@character_set_database").unwrap(),
        vec![vec![Value::Text("latin1".into())]]
    );

    ctx.session().set_current_database(Some("mydb".to_string()));
    assert_eq!(
        engine.query(&ctx, "SELECT @@collation_database").unwrap(),
        vec![vec![Value::Text("utf8mb4_0900_bin".into())]]
    );
}

#[test]
fn test_concurrent_global_access() {
    const ROUNDS: i64 = 500;
    let globals = GlobalVariables::new();
    let names = [
        "max_connections",
        "wait_timeout",
        "auto_increment_increment",
    ];

    thread::scope(|s| {
        for (writer, name) in names.iter().enumerate() {
            let globals = &globals;
            s.spawn(move || {
                for i in 1..=ROUNDS {
                    globals
                        .set_global(name, Value::Int64(writer as i64 * 10_000 + i))
                        .unwrap();
                }
            });
        }

        for _ in 0..4 {
            let globals = &globals;
            s.spawn(move || {
                for _ in 0..ROUNDS {
                    for (writer, name) in names.iter().enumerate() {
                        let (var, value) = globals.get_global(name).unwrap();
                        let Value::Int64(v) = value else {
                            panic!("{name} holds {value:?}");
                        };
                        let written = v - writer as i64 * 10_000;
                        assert!(
                            var.default == Value::Int64(v)
                                || (1..=ROUNDS).contains(&written),
                            "{name} = {v}"
                        );
                    }
                }
            });
        }
    });

    for (writer, name) in names.iter().enumerate() {
        assert_eq!(
            globals.get_global(name).unwrap().1,
            Value::Int64(writer as i64 * 10_000 + ROUNDS)
        );
    }
}
