//! Error types for sqldsl

use thiserror::Error;

/// Result type alias for sqldsl operations
pub type DslResult<T> = Result<T, DslError>;

/// Errors raised while building, rendering or executing statements.
#[derive(Debug, Error)]
pub enum DslError {
    /// Invalid DSL usage (builder misuse or a statement that cannot be rendered)
    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    /// A where clause rendered nothing and the statement does not allow it
    #[error(
        "All conditions in the where clause were dropped; set is_non_rendering_where_clause_allowed to permit this"
    )]
    NonRenderingWhereClause,

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// More rows than expected were returned
    #[error("Too many rows: expected {expected}, got {got}")]
    TooManyRows { expected: usize, got: usize },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Record serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl DslError {
    /// Create an invalid-usage error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidSql(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a too-many-rows error
    pub fn too_many_rows(expected: usize, got: usize) -> Self {
        Self::TooManyRows { expected, got }
    }

    /// Message for re-recording a nested builder error in an enclosing builder.
    pub(crate) fn into_message(self) -> String {
        match self {
            Self::InvalidSql(message) => message,
            other => other.to_string(),
        }
    }

    /// Check if this is an invalid-usage error
    pub fn is_invalid_sql(&self) -> bool {
        matches!(self, Self::InvalidSql(_) | Self::NonRenderingWhereClause)
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Wrap a tokio_postgres error, keeping the server message when present
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            if db_err.code().code().starts_with("08") {
                return Self::Connection(db_err.message().to_string());
            }
        }
        Self::Query(err)
    }
}

impl From<serde_json::Error> for DslError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DslError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
