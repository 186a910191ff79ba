//! Database Connection Management
//!
//! Opening, configuring and initializing the embedded libsql database that
//! stores statutes, their two hierarchies, annotations and the change log.
//!
//! # Architecture
//!
//! - **Path-agnostic**: accepts any file path; parent directories are created
//! - **WAL mode**: Write-Ahead Logging for concurrent readers
//! - **Foreign keys**: enabled on every connection so ownership cascades work
//! - **Sibling uniqueness**: enforced by partial unique indexes on `order_no`
//!
//! # Connection Patterns
//!
//! Use [`DatabaseService::session`] for autocommit reads and single-statement
//! writes, and [`DatabaseService::begin`] whenever several statements must
//! commit together. Both hand out connections configured by
//! [`DatabaseService::connect_with_timeout`].
//!
//! ```no_run
//! # use statute_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseService::new(PathBuf::from("./data/statutes.db")).await?;
//! let tx = db.begin().await?;
//! // ... writes through `tx` ...
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use crate::db::session::Session;
use crate::db::transaction::StoreTransaction;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Offset added to a node id to park it outside the dense `1..=N` range
/// while a sibling group is being renumbered.
pub const PLACEHOLDER_OFFSET: i64 = 1_000_000_000;

/// Database service owning the libsql handle and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub db: Arc<Database>,
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if db_path.as_os_str().is_empty() {
            return Err(DatabaseError::invalid_path(db_path));
        }

        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        tracing::debug!("Opened statute database at {}", service.db_path.display());
        Ok(service)
    }

    /// PRAGMA statements return rows, so they go through `query()`
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        // Statements run when first stepped
        rows.next().await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes (idempotent)
    ///
    /// # Schema
    ///
    /// - `statutes`: root records, unique `name`
    /// - `nodes`: every hierarchy node of both hierarchies, keyed by `kind`
    /// - `annotations`: footnotes registered per statute
    /// - `change_log`: INSERT/UPDATE/DELETE audit trail
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        let statements: [(&str, &str); 9] = [
            (
                "statutes table",
                "CREATE TABLE IF NOT EXISTS statutes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    act_no TEXT UNIQUE,
                    date TEXT,
                    preface TEXT,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
                )",
            ),
            (
                "nodes table",
                "CREATE TABLE IF NOT EXISTS nodes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    statute_id INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    parent_id INTEGER,
                    order_no INTEGER NOT NULL,
                    label_no TEXT,
                    name TEXT,
                    content TEXT,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    modified_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (statute_id) REFERENCES statutes(id) ON DELETE CASCADE,
                    FOREIGN KEY (parent_id) REFERENCES nodes(id) ON DELETE CASCADE
                )",
            ),
            (
                "annotations table",
                "CREATE TABLE IF NOT EXISTS annotations (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    statute_id INTEGER NOT NULL,
                    no TEXT NOT NULL,
                    page_no TEXT,
                    footnote TEXT,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    modified_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (statute_id) REFERENCES statutes(id) ON DELETE CASCADE
                )",
            ),
            (
                "change_log table",
                "CREATE TABLE IF NOT EXISTS change_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    table_name TEXT NOT NULL,
                    record_id INTEGER NOT NULL,
                    action TEXT NOT NULL,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
                )",
            ),
            // One dense order sequence per parent node
            (
                "index 'idx_nodes_sibling_order'",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_sibling_order
                    ON nodes(parent_id, order_no) WHERE parent_id IS NOT NULL",
            ),
            // Parts and schedule parts hang off the statute
            (
                "index 'idx_nodes_root_order'",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_root_order
                    ON nodes(statute_id, kind, order_no) WHERE parent_id IS NULL",
            ),
            (
                "index 'idx_nodes_statute'",
                "CREATE INDEX IF NOT EXISTS idx_nodes_statute ON nodes(statute_id, kind)",
            ),
            (
                "index 'idx_annotations_statute'",
                "CREATE INDEX IF NOT EXISTS idx_annotations_statute ON annotations(statute_id, no)",
            ),
            (
                "index 'idx_change_log_record'",
                "CREATE INDEX IF NOT EXISTS idx_change_log_record
                    ON change_log(table_name, record_id)",
            ),
        ];

        for (what, sql) in statements {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create {}: {}", what, e))
            })?;
        }

        // Flush the schema for fresh files so a second handle sees it immediately
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Raw connection without per-connection settings
    ///
    /// Prefer [`connect_with_timeout`](Self::connect_with_timeout); a bare
    /// connection does not enforce foreign keys.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Connection with a 5 second busy timeout and foreign keys enabled
    ///
    /// `foreign_keys` is a per-connection setting in SQLite, so it is applied
    /// here rather than once at schema time.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    /// Autocommit session over a fresh connection
    pub async fn session(&self) -> Result<Session, DatabaseError> {
        Ok(Session::new(self.connect_with_timeout().await?))
    }

    /// Start a write transaction
    ///
    /// Uses `BEGIN IMMEDIATE` so the write lock is taken up front instead of
    /// failing halfway through a multi-statement operation.
    pub async fn begin(&self) -> Result<StoreTransaction, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        StoreTransaction::begin(conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let db = DatabaseService::new(db_path.clone()).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(db.db_path, db_path);
    }

    #[tokio::test]
    async fn test_schema_initialization_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let first = DatabaseService::new(db_path.clone()).await.unwrap();
        drop(first);
        let second = DatabaseService::new(db_path).await;

        assert!(second.is_ok(), "reopening an initialized database must succeed");
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let result = DatabaseService::new(PathBuf::new()).await;
        assert!(matches!(result, Err(DatabaseError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_root_order_index_rejects_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();

        conn.execute("INSERT INTO statutes (name) VALUES ('Act')", ())
            .await
            .unwrap();
        conn.execute(
            "INSERT INTO nodes (statute_id, kind, order_no, name) VALUES (1, 'part', 1, 'A')",
            (),
        )
        .await
        .unwrap();
        // A schedule part may share the position of a main part
        conn.execute(
            "INSERT INTO nodes (statute_id, kind, order_no, name) VALUES (1, 'sch_part', 1, 'S')",
            (),
        )
        .await
        .unwrap();

        let duplicate = conn
            .execute(
                "INSERT INTO nodes (statute_id, kind, order_no, name) VALUES (1, 'part', 1, 'B')",
                (),
            )
            .await;
        assert!(duplicate.is_err());
    }
}
