//! Sessions and per-query contexts

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{Catalog, QualifiedName};
use crate::types::{Collation, SqlType, Value};
use crate::vars::{
    GlobalVariables, SessionVariables, UserVariables, CHARACTER_SET_DATABASE_VAR,
    COLLATION_DATABASE_VAR,
};
use crate::view_registry::ViewRegistry;

/// State owned by one client connection
#[derive(Debug)]
pub struct Session {
    id: u32,
    current_database: RwLock<Option<String>>,
    variables: RwLock<SessionVariables>,
    user_variables: RwLock<UserVariables>,
}

impl Session {
    pub fn new(id: u32, current_database: Option<String>) -> Self {
        Self {
            id,
            current_database: RwLock::new(current_database),
            variables: RwLock::new(SessionVariables::new()),
            user_variables: RwLock::new(UserVariables::new()),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn current_database(&self) -> Option<String> {
        self.current_database.read().clone()
    }

    pub fn set_current_database(&self, database: Option<String>) {
        debug!(session = self.id, database = ?database, "changed current database");
        *self.current_database.write() = database;
    }

    /// Stored value of a session variable, without derived variables
    pub fn variable(&self, name: &str) -> Option<(SqlType, Value)> {
        self.variables.read().get(name)
    }

    pub fn set_variable(&self, name: &str, value: Value) -> Result<()> {
        self.variables.write().set(name, value)
    }

    pub fn set_variable_default(&self, name: &str) -> Result<()> {
        self.variables.write().set_default(name)
    }

    pub fn variables(&self) -> RwLockReadGuard<'_, SessionVariables> {
        self.variables.read()
    }

    pub fn user_variable(&self, name: &str) -> (SqlType, Value) {
        self.user_variables.read().get(name)
    }

    pub fn set_user_variable(&self, name: &str, value: Value) {
        self.user_variables.write().set(name, value);
    }

    pub fn user_variables(&self) -> RwLockReadGuard<'_, UserVariables> {
        self.user_variables.read()
    }
}

/// Everything a rule or node needs while handling one query
#[derive(Debug, Clone)]
pub struct Context {
    session: Arc<Session>,
    catalog: Arc<RwLock<Catalog>>,
    globals: Arc<GlobalVariables>,
    views: Arc<ViewRegistry>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new(
        session: Arc<Session>,
        catalog: Arc<RwLock<Catalog>>,
        globals: Arc<GlobalVariables>,
        views: Arc<ViewRegistry>,
    ) -> Self {
        Self {
            session,
            catalog,
            globals,
            views,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read()
    }

    pub fn globals(&self) -> &GlobalVariables {
        &self.globals
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn current_database(&self) -> Option<String> {
        self.session.current_database()
    }

    /// Database a possibly unqualified name lives in
    pub fn database_for(&self, name: &QualifiedName) -> Result<String> {
        name.database
            .clone()
            .or_else(|| self.current_database())
            .ok_or(Error::NoDatabaseSelected)
    }

    /// Fail if the query was cancelled or ran past its deadline
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Session-scope read of a system variable.
    ///
    /// `character_set_database` and `collation_database` are computed from
    /// the current database on every read and never come from storage.
    pub fn system_variable(&self, name: &str) -> Result<(SqlType, Value)> {
        if name.eq_ignore_ascii_case(COLLATION_DATABASE_VAR) {
            let collation = self.database_collation();
            return Ok((SqlType::LongText, Value::Text(collation.name().to_string())));
        }
        if name.eq_ignore_ascii_case(CHARACTER_SET_DATABASE_VAR) {
            let charset = self.database_collation().character_set();
            return Ok((SqlType::LongText, Value::Text(charset.to_string())));
        }

        self.session
            .variable(name)
            .ok_or_else(|| Error::UnknownSystemVariable(name.to_string()))
    }

    fn database_collation(&self) -> Collation {
        self.current_database()
            .and_then(|db| self.catalog().database_collation(&db))
            .unwrap_or_default()
    }

    /// Collation named by the session's `collation_connection`
    pub fn connection_collation(&self) -> Collation {
        self.session
            .variable("collation_connection")
            .and_then(|(_, value)| value.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or_default()
    }
}
