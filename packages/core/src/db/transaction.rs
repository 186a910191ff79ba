//! Explicit transaction context
//!
//! Operations that must commit atomically receive a `StoreTransaction`
//! instead of reaching for ambient state. It dereferences to [`Session`], so
//! every query and the [`NodeStore`](crate::db::NodeStore) implementation
//! run inside the transaction.

use crate::db::error::DatabaseError;
use crate::db::session::Session;
use std::ops::Deref;

pub struct StoreTransaction {
    session: Session,
    finished: bool,
}

impl StoreTransaction {
    pub(crate) async fn begin(conn: libsql::Connection) -> Result<Self, DatabaseError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(Self {
            session: Session::new(conn),
            finished: false,
        })
    }

    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        self.finished = true;
        let conn = self.session.connection();

        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), DatabaseError> {
        self.finished = true;
        self.session
            .connection()
            .execute("ROLLBACK", ())
            .await
            .map_err(|e| {
                DatabaseError::transaction_failed(format!("Failed to roll back transaction: {}", e))
            })?;
        Ok(())
    }
}

impl Deref for StoreTransaction {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl Drop for StoreTransaction {
    fn drop(&mut self) {
        // Closing the connection discards the open transaction
        if !self.finished {
            tracing::debug!("Transaction dropped without commit; changes discarded");
        }
    }
}
