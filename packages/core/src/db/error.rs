//! Database Error Types
//!
//! Errors for connection, schema initialization, query execution and
//! transaction control against the embedded libsql database.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    #[error("Invalid database path: {path}")]
    InvalidPath { path: PathBuf },

    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A stored row could not be mapped onto a model
    #[error("Failed to read row: {context}")]
    RowConversion { context: String },

    #[error("Transaction failed: {context}")]
    TransactionFailed { context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    pub fn row_conversion(context: impl Into<String>) -> Self {
        Self::RowConversion {
            context: context.into(),
        }
    }

    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }

    /// True when the failure came from a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        let text = self.to_string();
        text.contains("UNIQUE constraint failed")
    }
}
