//! Database Layer
//!
//! Embedded libsql storage for statutes, hierarchy nodes, annotations and
//! the change log.
//!
//! - `DatabaseService`: opens the database and owns the schema
//! - `Session`: every SQL statement, over one connection
//! - `StoreTransaction`: a `Session` inside `BEGIN IMMEDIATE ... COMMIT`
//! - `NodeStore`: the seam the ordering engine is written against

mod change_log;
mod database;
mod error;
mod node_store;
mod rows;
mod session;
mod transaction;

pub use change_log::{ChangeAction, ChangeEntry, ChangeTable};
pub use database::{DatabaseService, PLACEHOLDER_OFFSET};
pub use error::DatabaseError;
pub use node_store::NodeStore;
pub use session::Session;
pub use transaction::StoreTransaction;
