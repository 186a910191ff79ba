//! Business Services
//!
//! - `StatuteService` - statute CRUD with unique names
//! - `AnnotationService` - the per-statute footnote table
//! - `HierarchyService` - transactional hierarchy edits, tree and book view
//!
//! Services own an `Arc<DatabaseService>` and open a session per read and a
//! transaction per write, so every row change commits together with its
//! change-log entry.

pub mod annotation_service;
pub mod error;
pub mod hierarchy_service;
pub mod statute_service;

#[cfg(test)]
mod statute_service_test;

pub use annotation_service::AnnotationService;
pub use error::ServiceError;
pub use hierarchy_service::HierarchyService;
pub use statute_service::StatuteService;

use crate::db::StoreTransaction;

/// Commit on success, roll back on failure
pub(crate) async fn finish<T, E>(
    tx: StoreTransaction,
    result: Result<T, E>,
) -> Result<T, ServiceError>
where
    E: Into<ServiceError>,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback after failed operation also failed: {}", rollback_err);
            }
            let e = e.into();
            tracing::debug!("Transaction rolled back: {}", e);
            Err(e)
        }
    }
}
