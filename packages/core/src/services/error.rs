//! Service Layer Error Types
//!
//! Failures surfaced by the services, wrapping the storage and hierarchy
//! layers below them.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use crate::operations::OperationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Statute not found: {id}")]
    StatuteNotFound { id: i64 },

    #[error("Annotation not found: {id}")]
    AnnotationNotFound { id: i64 },

    #[error("Node not found: {id}")]
    NodeNotFound { id: i64 },

    /// Statute names are unique
    #[error("A statute named '{name}' already exists")]
    DuplicateStatute { name: String },

    #[error("A statute with act number '{act_no}' already exists")]
    DuplicateActNo { act_no: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// A hierarchy operation was rejected or rolled back
    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),
}

impl ServiceError {
    pub fn statute_not_found(id: i64) -> Self {
        Self::StatuteNotFound { id }
    }

    pub fn annotation_not_found(id: i64) -> Self {
        Self::AnnotationNotFound { id }
    }

    pub fn node_not_found(id: i64) -> Self {
        Self::NodeNotFound { id }
    }

    pub fn duplicate_statute(name: impl Into<String>) -> Self {
        Self::DuplicateStatute { name: name.into() }
    }

    pub fn duplicate_act_no(act_no: impl Into<String>) -> Self {
        Self::DuplicateActNo {
            act_no: act_no.into(),
        }
    }

    /// The request was wrong; nothing was written
    pub fn is_structural(&self) -> bool {
        match self {
            Self::Operation(e) => e.is_structural(),
            Self::DatabaseError(_) => false,
            _ => true,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StatuteNotFound { .. }
                | Self::AnnotationNotFound { .. }
                | Self::NodeNotFound { .. }
                | Self::Operation(OperationError::StatuteNotFound { .. })
                | Self::Operation(OperationError::NodeNotFound { .. })
        )
    }
}
