//! Schema builder - converts DDL to a Catalog

use patterns::{DATABASE_CHARSET, DATABASE_COLLATION, USE_DATABASE};
use sqlparser::ast::{
    self, AlterTableOperation, ColumnOption, ObjectName, Statement, TableConstraint,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticKind, Severity};
use crate::schema::{Catalog, ColumnDef, QualifiedName, TableDef};
use crate::types::{Collation, SqlType};

/// Builder for constructing a Catalog from SQL schema definitions
pub struct SchemaBuilder {
    catalog: Catalog,
    /// Database selected by the last `USE` statement
    current_database: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            current_database: None,
            diagnostics: Vec::new(),
        }
    }

    /// Parse SQL schema definitions and build the catalog
    ///
    /// Statements are handled one at a time so that unsupported syntax
    /// (procedures, triggers, ...) is skipped without losing the rest.
    pub fn parse(&mut self, sql: &str) -> Result<(), Vec<Diagnostic>> {
        let dialect = MySqlDialect {};

        for raw_stmt in split_sql_statements(sql) {
            let trimmed = raw_stmt.trim();
            if trimmed.is_empty() || self.process_raw_statement(trimmed) {
                continue;
            }

            match Parser::parse_sql(&dialect, trimmed) {
                Ok(stmts) => {
                    for stmt in stmts {
                        self.process_statement(&stmt);
                    }
                }
                Err(e) => {
                    debug!(error = %e, "skipping unparseable schema statement");
                }
            }
        }

        if self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
        {
            Err(std::mem::take(&mut self.diagnostics))
        } else {
            Ok(())
        }
    }

    /// Finish building, returning the catalog and any warnings
    pub fn build(self) -> (Catalog, Vec<Diagnostic>) {
        (self.catalog, self.diagnostics)
    }

    /// Handle statements the parser does not model. Returns true when consumed.
    fn process_raw_statement(&mut self, sql: &str) -> bool {
        if let Some(caps) = USE_DATABASE.captures(sql) {
            let name = unquote(&caps[1]);
            self.catalog.get_or_create_database(&name);
            self.current_database = Some(name);
            return true;
        }

        let upper = sql.to_uppercase();
        if upper.starts_with("CREATE DATABASE") || upper.starts_with("CREATE SCHEMA") {
            let Some(name) = sql.split_whitespace().find(|w| !is_create_keyword(w)) else {
                return false;
            };
            let name = unquote(name);
            let collation = DATABASE_COLLATION
                .captures(sql)
                .and_then(|caps| caps[4].parse::<Collation>().ok())
                .or_else(|| {
                    DATABASE_CHARSET
                        .captures(sql)
                        .and_then(|caps| caps[4].parse::<Collation>().ok())
                });
            let database = self.catalog.get_or_create_database(&name);
            if let Some(collation) = collation {
                database.collation = collation;
            }
            return true;
        }

        false
    }

    /// Process a single SQL statement
    fn process_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::CreateTable(create) => {
                self.process_create_table(create);
            }
            Statement::AlterTable {
                name, operations, ..
            } => {
                self.process_alter_table(name, operations);
            }
            _ => {}
        }
    }

    /// Process CREATE TABLE statement
    fn process_create_table(&mut self, create: &ast::CreateTable) {
        let name = self.qualify(object_name_to_qualified(&create.name));
        let mut table = TableDef::new(name);

        for column in &create.columns {
            let column = column_from_ast(column);
            table.columns.insert(column.name.clone(), column);
        }

        for constraint in &create.constraints {
            if let TableConstraint::PrimaryKey { columns, .. } = constraint {
                for col in columns {
                    if let Some(def) = table.columns.get_mut(&col.value) {
                        def.is_primary_key = true;
                        def.nullable = false;
                    }
                }
            }
        }

        debug!(table = %table.name, columns = table.columns.len(), "registered table");
        self.catalog.add_table(table);
    }

    /// Process ALTER TABLE statement
    fn process_alter_table(&mut self, name: &ObjectName, operations: &[AlterTableOperation]) {
        let table_name = self.qualify(object_name_to_qualified(name));

        let Some(table) = self.catalog.get_table_mut(&table_name) else {
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::TableNotFound,
                    format!(
                        "ALTER TABLE references table '{}' which was not found in schema",
                        table_name
                    ),
                )
                .with_help("Ensure the CREATE TABLE statement appears before ALTER TABLE"),
            );
            return;
        };

        for operation in operations {
            match operation {
                AlterTableOperation::AddColumn { column_def, .. } => {
                    let column = column_from_ast(column_def);
                    table.columns.insert(column.name.clone(), column);
                }
                AlterTableOperation::DropColumn { column_name, .. } => {
                    table.columns.shift_remove(&column_name.value);
                }
                AlterTableOperation::RenameColumn {
                    old_column_name,
                    new_column_name,
                } => {
                    if let Some(mut col) = table.columns.shift_remove(&old_column_name.value) {
                        col.name = new_column_name.value.clone();
                        table.columns.insert(new_column_name.value.clone(), col);
                    }
                }
                _ => {}
            }
        }
    }

    /// Place an unqualified name in the database chosen by `USE`, if any
    fn qualify(&self, name: QualifiedName) -> QualifiedName {
        match (&name.database, &self.current_database) {
            (None, Some(current)) => QualifiedName::with_database(current, name.name),
            _ => name,
        }
    }
}

/// Column definition with its NULL / NOT NULL / PRIMARY KEY options applied
fn column_from_ast(column: &ast::ColumnDef) -> ColumnDef {
    let mut def = ColumnDef::new(&column.name.value, SqlType::from_ast(&column.data_type));
    for option in &column.options {
        def = match &option.option {
            ColumnOption::Null => ColumnDef {
                nullable: true,
                ..def
            },
            ColumnOption::NotNull => def.not_null(),
            ColumnOption::Unique {
                is_primary: true, ..
            } => def.primary_key(),
            _ => def,
        };
    }
    def
}

fn is_create_keyword(word: &str) -> bool {
    matches!(
        word.to_uppercase().as_str(),
        "CREATE" | "DATABASE" | "SCHEMA" | "IF" | "NOT" | "EXISTS"
    )
}

fn unquote(name: &str) -> String {
    name.trim_matches(|c| c == '`' || c == '"' || c == ';').to_string()
}

/// Convert sqlparser ObjectName to our QualifiedName
pub(crate) fn object_name_to_qualified(name: &ObjectName) -> QualifiedName {
    match name.0.as_slice() {
        [table] => QualifiedName::new(&table.value),
        [database, table] => QualifiedName::with_database(&database.value, &table.value),
        _ => QualifiedName::new(name.to_string()),
    }
}

/// Split SQL text into individual statements by semicolons,
/// respecting quoted strings, quoted identifiers and comments.
pub(crate) fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < len {
                    if bytes[i] == b'\\' && quote != b'`' {
                        i += 2;
                    } else if bytes[i] == quote {
                        i += 1;
                        if i < len && bytes[i] == quote {
                            i += 1; // doubled quote
                        } else {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'#' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len {
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                let stmt = &sql[start..i];
                if !stmt.trim().is_empty() {
                    statements.push(stmt);
                }
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    // Handle last statement (without trailing semicolon)
    if start < len {
        let last = &sql[start..];
        if !last.trim().is_empty() {
            statements.push(last);
        }
    }

    statements
}

mod patterns {
    use std::sync::LazyLock;

    use regex::Regex;

    pub(super) static USE_DATABASE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^\s*USE\s+(`[^`]+`|[A-Za-z0-9_$]+)\s*$").expect("valid regex")
    });

    pub(super) static DATABASE_COLLATION: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)(DEFAULT)?\s+COLLATE((\s*=?\s*)|\s+)([A-Za-z0-9_]+)").expect("valid regex")
    });

    pub(super) static DATABASE_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)(DEFAULT)?\s+CHARACTER\s+SET((\s*=?\s*)|\s+)([A-Za-z0-9_]+)")
            .expect("valid regex")
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                email TEXT UNIQUE
            );
        "#;

        let mut builder = SchemaBuilder::new();
        builder.parse(sql).unwrap();
        let (catalog, _) = builder.build();

        let table = catalog.get_table(&QualifiedName::new("users")).unwrap();
        assert_eq!(table.columns.len(), 3);

        let id_col = table.get_column("id").unwrap();
        assert!(!id_col.nullable);
        assert!(id_col.is_primary_key);

        let name_col = table.get_column("name").unwrap();
        assert!(!name_col.nullable);
        assert!(matches!(name_col.data_type, SqlType::Varchar { .. }));

        let email_col = table.get_column("email").unwrap();
        assert!(email_col.nullable);
    }

    #[test]
    fn test_use_and_create_database() {
        let sql = r#"
            CREATE DATABASE shop DEFAULT COLLATE latin1_swedish_ci;
            USE shop;
            CREATE TABLE orders (id BIGINT NOT NULL, total DECIMAL(10, 2));
        "#;

        let mut builder = SchemaBuilder::new();
        builder.parse(sql).unwrap();
        let (catalog, _) = builder.build();

        assert!(catalog.table_exists(&QualifiedName::with_database("shop", "orders")));
        assert!(!catalog.table_exists(&QualifiedName::new("orders")));
        assert_eq!(
            catalog.database_collation("shop"),
            Some(Collation::Latin1_swedish_ci)
        );
    }

    #[test]
    fn test_alter_table_add_and_drop() {
        let sql = r#"
            CREATE TABLE t (a INT, b INT);
            ALTER TABLE t ADD COLUMN c TEXT NOT NULL;
            ALTER TABLE t DROP COLUMN a;
        "#;

        let mut builder = SchemaBuilder::new();
        builder.parse(sql).unwrap();
        let (catalog, _) = builder.build();

        let table = catalog.get_table(&QualifiedName::new("t")).unwrap();
        assert_eq!(table.column_names(), vec!["b", "c"]);
        assert!(!table.get_column("c").unwrap().nullable);
    }

    #[test]
    fn test_alter_missing_table_warns() {
        let mut builder = SchemaBuilder::new();
        builder.parse("ALTER TABLE ghost ADD COLUMN c INT").unwrap();
        let (_, diagnostics) = builder.build();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_split_preserves_string_literals() {
        let sql = "SELECT 'hello; world'; SET @x = `odd;name`; # trailing; comment\nSELECT 1";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 3);
        assert!(stmts[0].contains("hello; world"));
        assert!(stmts[1].contains("`odd;name`"));
    }

    #[test]
    fn test_parse_skips_unsupported_statements() {
        let sql = r#"
            CREATE PROCEDURE p() BEGIN SELECT 1 END;
            CREATE TABLE actor (actor_id INT NOT NULL, first_name VARCHAR(45) NOT NULL);
        "#;

        let mut builder = SchemaBuilder::new();
        builder.parse(sql).unwrap();
        let (catalog, _) = builder.build();
        assert!(catalog.table_exists(&QualifiedName::new("actor")));
    }
}
