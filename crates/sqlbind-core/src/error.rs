//! Error and diagnostic types

use miette::SourceSpan;
use serde::{Deserialize, Serialize};

/// Result type used throughout the resolver
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while building, resolving or executing plans
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error("table not found: {0}")]
    #[diagnostic(code(sqlbind::table_not_found))]
    TableNotFound(String),

    #[error("column \"{0}\" could not be found in any table in scope")]
    #[diagnostic(code(sqlbind::column_not_found))]
    ColumnNotFound(String),

    #[error("ambiguous table or alias name: {0}")]
    #[diagnostic(
        code(sqlbind::ambiguous_table),
        help("give each table in the FROM clause a distinct alias")
    )]
    AmbiguousTableAlias(String),

    #[error("ambiguous column name \"{0}\", it's present in more than one table")]
    #[diagnostic(code(sqlbind::ambiguous_column), help("qualify the column with its table"))]
    AmbiguousColumn(String),

    #[error(
        "cannot union two queries whose schemas are different lengths; left has {left} column(s) right has {right} column(s)."
    )]
    #[diagnostic(code(sqlbind::different_column_counts))]
    DifferentColumnCounts { left: usize, right: usize },

    #[error("plan is not resolved: {0}")]
    #[diagnostic(code(sqlbind::not_resolved))]
    NotResolved(String),

    #[error("exceeded max analysis iterations ({iterations}) in batch '{batch}'")]
    #[diagnostic(
        code(sqlbind::iteration_cap),
        help("a rule keeps rewriting the plan; check rule ordering and idempotence")
    )]
    IterationCapReached { batch: String, iterations: usize },

    #[error("no database selected")]
    #[diagnostic(code(sqlbind::no_database))]
    NoDatabaseSelected,

    #[error("Unknown system variable '{0}'")]
    #[diagnostic(code(sqlbind::unknown_variable))]
    UnknownSystemVariable(String),

    #[error("Variable '{name}' is a {scope} variable and can't be used with {usage}")]
    #[diagnostic(code(sqlbind::variable_scope))]
    WrongVariableScope {
        name: String,
        scope: String,
        usage: String,
    },

    #[error("Variable '{0}' is a read only variable")]
    #[diagnostic(code(sqlbind::read_only_variable))]
    ReadOnlyVariable(String),

    #[error("Variable '{name}' can't be set to the value of '{value}'")]
    #[diagnostic(code(sqlbind::invalid_variable_value))]
    InvalidVariableValue { name: String, value: String },

    #[error("the view {database}.{name} already exists")]
    #[diagnostic(code(sqlbind::existing_view))]
    ExistingView { database: String, name: String },

    #[error("the view {database}.{name} does not exist")]
    #[diagnostic(code(sqlbind::non_existing_view))]
    NonExistingView { database: String, name: String },

    #[error("{node}: invalid children number, got {got}, expected {expected}")]
    #[diagnostic(code(sqlbind::invalid_children))]
    InvalidChildrenNumber {
        node: String,
        got: usize,
        expected: usize,
    },

    #[error("field {name} at index {index} is out of range for a row of {width} value(s)")]
    #[diagnostic(code(sqlbind::field_out_of_range))]
    FieldOutOfRange {
        name: String,
        index: usize,
        width: usize,
    },

    #[error("Subquery returns more than 1 row")]
    #[diagnostic(code(sqlbind::subquery_rows))]
    SubqueryReturnsMultipleRows,

    #[error("no replication controller available")]
    #[diagnostic(code(sqlbind::no_replication_controller))]
    NoReplicationController,

    #[error("replication error: {0}")]
    #[diagnostic(code(sqlbind::replication))]
    Replication(String),

    #[error("query was cancelled")]
    #[diagnostic(code(sqlbind::cancelled))]
    Cancelled,

    #[error("query deadline exceeded")]
    #[diagnostic(code(sqlbind::deadline_exceeded))]
    DeadlineExceeded,

    #[error("parse error: {0}")]
    #[diagnostic(code(sqlbind::parse))]
    Parse(String),

    #[error("unsupported: {0}")]
    #[diagnostic(code(sqlbind::unsupported))]
    Unsupported(String),
}

impl Error {
    /// Diagnostic category of this error
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Error::TableNotFound(_) => DiagnosticKind::TableNotFound,
            Error::ColumnNotFound(_) => DiagnosticKind::ColumnNotFound,
            Error::AmbiguousTableAlias(_) | Error::AmbiguousColumn(_) => {
                DiagnosticKind::AmbiguousReference
            }
            Error::DifferentColumnCounts { .. } => DiagnosticKind::ColumnCountMismatch,
            Error::NotResolved(_) | Error::IterationCapReached { .. } => {
                DiagnosticKind::UnresolvedPlan
            }
            Error::NoDatabaseSelected => DiagnosticKind::NoDatabaseSelected,
            Error::UnknownSystemVariable(_)
            | Error::WrongVariableScope { .. }
            | Error::ReadOnlyVariable(_)
            | Error::InvalidVariableValue { .. } => DiagnosticKind::InvalidVariable,
            Error::ExistingView { .. } | Error::NonExistingView { .. } => {
                DiagnosticKind::ViewCatalog
            }
            Error::InvalidChildrenNumber { .. }
            | Error::FieldOutOfRange { .. }
            | Error::SubqueryReturnsMultipleRows => DiagnosticKind::InvalidPlan,
            Error::NoReplicationController | Error::Replication(_) => {
                DiagnosticKind::Replication
            }
            Error::Cancelled | Error::DeadlineExceeded => DiagnosticKind::Cancelled,
            Error::Parse(_) => DiagnosticKind::ParseError,
            Error::Unsupported(_) => DiagnosticKind::Unsupported,
        }
    }
}

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of source (optional, for miette compatibility)
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Span {
    /// Create a span with byte offset
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            line: 0,
            column: 0,
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.offset.into(), span.length)
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Diagnostic message reported for one statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Get the error code string (e.g., "E0001")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let diag = Diagnostic::error(err.kind(), err.to_string());
        match miette::Diagnostic::help(err) {
            Some(help) => diag.with_help(help.to_string()),
            None => diag,
        }
    }
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// E0001: Table not found
    TableNotFound,
    /// E0002: Column not found
    ColumnNotFound,
    /// E0003: Ambiguous table alias or column reference
    AmbiguousReference,
    /// E0004: Column count mismatch across UNION sides
    ColumnCountMismatch,
    /// E0005: Plan could not be fully resolved
    UnresolvedPlan,
    /// E0006: No current database for an unqualified table
    NoDatabaseSelected,
    /// E0007: Unknown or invalid system variable assignment
    InvalidVariable,
    /// E0008: View already exists / does not exist
    ViewCatalog,
    /// E0009: Structurally invalid plan
    InvalidPlan,
    /// E0010: Replication statement could not run
    Replication,
    /// E0011: Query cancelled or timed out
    Cancelled,
    /// Parse error
    ParseError,
    /// Statement shape not supported by the plan builder
    Unsupported,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "E0001",
            DiagnosticKind::ColumnNotFound => "E0002",
            DiagnosticKind::AmbiguousReference => "E0003",
            DiagnosticKind::ColumnCountMismatch => "E0004",
            DiagnosticKind::UnresolvedPlan => "E0005",
            DiagnosticKind::NoDatabaseSelected => "E0006",
            DiagnosticKind::InvalidVariable => "E0007",
            DiagnosticKind::ViewCatalog => "E0008",
            DiagnosticKind::InvalidPlan => "E0009",
            DiagnosticKind::Replication => "E0010",
            DiagnosticKind::Cancelled => "E0011",
            DiagnosticKind::ParseError => "E1000",
            DiagnosticKind::Unsupported => "E1001",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "table-not-found",
            DiagnosticKind::ColumnNotFound => "column-not-found",
            DiagnosticKind::AmbiguousReference => "ambiguous-reference",
            DiagnosticKind::ColumnCountMismatch => "column-count-mismatch",
            DiagnosticKind::UnresolvedPlan => "unresolved-plan",
            DiagnosticKind::NoDatabaseSelected => "no-database-selected",
            DiagnosticKind::InvalidVariable => "invalid-variable",
            DiagnosticKind::ViewCatalog => "view-catalog",
            DiagnosticKind::InvalidPlan => "invalid-plan",
            DiagnosticKind::Replication => "replication",
            DiagnosticKind::Cancelled => "cancelled",
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::Unsupported => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_from_error() {
        let err = Error::AmbiguousColumn("id".to_string());
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.kind, DiagnosticKind::AmbiguousReference);
        assert_eq!(diag.code(), "E0003");
        assert!(diag.message.contains("\"id\""));
        assert_eq!(diag.help.as_deref(), Some("qualify the column with its table"));
    }

    #[test]
    fn test_union_message() {
        let err = Error::DifferentColumnCounts { left: 2, right: 1 };
        assert_eq!(
            err.to_string(),
            "cannot union two queries whose schemas are different lengths; left has 2 column(s) right has 1 column(s)."
        );
    }
}
