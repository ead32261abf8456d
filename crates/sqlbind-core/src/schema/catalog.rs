//! Schema catalog - stores database, table and column definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::{Column, Schema};
use crate::types::{Collation, SqlType};

/// Database used when DDL does not name one
pub const DEFAULT_DATABASE: &str = "mydb";

/// Schema catalog - holds all database/table information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Lower-cased database name -> Database
    pub databases: IndexMap<String, Database>,
    /// Database that unqualified DDL lands in
    pub default_database: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        let mut catalog = Self {
            databases: IndexMap::new(),
            default_database: DEFAULT_DATABASE.to_string(),
        };
        catalog.get_or_create_database(DEFAULT_DATABASE);
        catalog
    }

    /// Get or create a database
    pub fn get_or_create_database(&mut self, name: &str) -> &mut Database {
        self.databases
            .entry(name.to_lowercase())
            .or_insert_with(|| Database::new(name))
    }

    /// Look up a database by name (case-insensitive)
    pub fn get_database(&self, name: &str) -> Option<&Database> {
        self.databases.get(&name.to_lowercase())
    }

    pub fn database_exists(&self, name: &str) -> bool {
        self.get_database(name).is_some()
    }

    /// Collation of a database, read at call time
    pub fn database_collation(&self, name: &str) -> Option<Collation> {
        self.get_database(name).map(|db| db.collation)
    }

    /// Add a table to the catalog
    pub fn add_table(&mut self, table: TableDef) {
        let database_name = table
            .name
            .database
            .clone()
            .unwrap_or_else(|| self.default_database.clone());
        let database = self.get_or_create_database(&database_name);
        database.tables.insert(table.name.name.to_lowercase(), table);
    }

    /// Look up a table by name
    pub fn get_table(&self, name: &QualifiedName) -> Option<&TableDef> {
        let database_name = name.database.as_ref().unwrap_or(&self.default_database);
        self.get_database(database_name)
            .and_then(|db| db.tables.get(&name.name.to_lowercase()))
    }

    /// Look up a table by name (mutable)
    pub fn get_table_mut(&mut self, name: &QualifiedName) -> Option<&mut TableDef> {
        let database_name = name
            .database
            .as_ref()
            .unwrap_or(&self.default_database)
            .to_lowercase();
        self.databases
            .get_mut(&database_name)
            .and_then(|db| db.tables.get_mut(&name.name.to_lowercase()))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &QualifiedName) -> bool {
        self.get_table(name).is_some()
    }
}

/// A database (namespace of tables)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub collation: Collation,
    pub tables: IndexMap<String, TableDef>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collation: Collation::default(),
            tables: IndexMap::new(),
        }
    }
}

/// Qualified name (database.table or just table)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub database: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            name: name.into(),
        }
    }

    pub fn with_database(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            name: name.into(),
        }
    }

    /// Parse from a dotted name like "db.table" or just "table"
    pub fn parse(s: &str) -> Self {
        if let Some((database, name)) = s.split_once('.') {
            Self::with_database(database, name)
        } else {
            Self::new(s)
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(database) = &self.database {
            write!(f, "{}.{}", database, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: QualifiedName,
    pub columns: IndexMap<String, ColumnDef>,
}

impl TableDef {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            columns: IndexMap::new(),
        }
    }

    /// Builder-style column insertion
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        // Case-insensitive lookup
        self.columns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Get all column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }

    /// Plan schema of this table, every column tagged with the table name
    pub fn schema(&self) -> Schema {
        self.columns
            .values()
            .map(|col| Column {
                name: col.name.clone(),
                source: self.name.name.clone(),
                sql_type: col.data_type.clone(),
                nullable: col.nullable,
            })
            .collect()
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: SqlType,
    pub nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            is_primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }
}
