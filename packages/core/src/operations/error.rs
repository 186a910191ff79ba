//! Error types for hierarchy reordering
//!
//! Two families of failure, and callers treat them differently:
//!
//! - **Structural**: the request itself is wrong (unknown node, wrong kind,
//!   parent of the wrong level, unknown temporary id). Retrying the same
//!   request will fail again.
//! - **Transactional**: storage failed while applying a valid request. The
//!   transaction was rolled back and nothing changed.
//!
//! ```rust
//! use statute_core::operations::OperationError;
//!
//! let err = OperationError::node_not_found(7);
//! assert!(err.is_structural());
//! ```

use crate::db::DatabaseError;
use crate::models::{NodeKind, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Statute {statute_id} not found")]
    StatuteNotFound { statute_id: i64 },

    #[error("Node {node_id} not found")]
    NodeNotFound { node_id: i64 },

    /// The request names a kind that does not match the stored node
    #[error("Node {node_id} is a {actual}, not a {expected}")]
    KindMismatch {
        node_id: i64,
        expected: NodeKind,
        actual: NodeKind,
    },

    /// A parent of the wrong level or from another statute
    #[error("Invalid parent for {kind}: {reason}")]
    ParentMismatch { kind: NodeKind, reason: String },

    #[error("Node {node_id} belongs to statute {actual}, not statute {expected}")]
    WrongStatute {
        node_id: i64,
        expected: i64,
        actual: i64,
    },

    /// A bulk save referenced a temporary id it never created
    #[error("Unknown temporary id '{temp_id}'")]
    UnknownTempId { temp_id: String },

    #[error("Temporary id '{temp_id}' is used more than once")]
    DuplicateTempId { temp_id: String },

    #[error("Invalid reorder request: {0}")]
    InvalidRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failed; the transaction was rolled back
    #[error("Storage failure, changes rolled back: {0}")]
    Storage(#[from] DatabaseError),
}

impl OperationError {
    pub fn statute_not_found(statute_id: i64) -> Self {
        Self::StatuteNotFound { statute_id }
    }

    pub fn node_not_found(node_id: i64) -> Self {
        Self::NodeNotFound { node_id }
    }

    pub fn kind_mismatch(node_id: i64, expected: NodeKind, actual: NodeKind) -> Self {
        Self::KindMismatch {
            node_id,
            expected,
            actual,
        }
    }

    pub fn parent_mismatch(kind: NodeKind, reason: impl Into<String>) -> Self {
        Self::ParentMismatch {
            kind,
            reason: reason.into(),
        }
    }

    pub fn wrong_statute(node_id: i64, expected: i64, actual: i64) -> Self {
        Self::WrongStatute {
            node_id,
            expected,
            actual,
        }
    }

    pub fn unknown_temp_id(temp_id: impl Into<String>) -> Self {
        Self::UnknownTempId {
            temp_id: temp_id.into(),
        }
    }

    pub fn duplicate_temp_id(temp_id: impl Into<String>) -> Self {
        Self::DuplicateTempId {
            temp_id: temp_id.into(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    /// The request violates hierarchy rules; retrying will not help
    pub fn is_structural(&self) -> bool {
        !self.is_transactional()
    }

    /// Storage failed while applying the request
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
