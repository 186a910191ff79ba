//! Statute Book Core
//!
//! Storage, citation rendering and hierarchy ordering for a statute book:
//! statutes made of two ordered hierarchies (parts down to subsections, and
//! their schedule counterparts) whose text cites footnotes from the
//! statute's annotation table.
//!
//! # Architecture
//!
//! - **libsql**: embedded SQLite database, one file per book
//! - **Dense ordering**: every sibling group is numbered `1..=N` after each
//!   committed change, enforced by unique indexes
//! - **Explicit transactions**: hierarchy edits run on a `StoreTransaction`
//!   and commit or roll back as a whole
//!
//! # Modules
//!
//! - [`models`] - Statute, Node, Annotation and their validation
//! - [`db`] - Database layer with libsql integration
//! - [`markup`] - Citation tag rewriting and annotation lookup
//! - [`hierarchy`] - Tree read model and book view
//! - [`operations`] - Reorder engine: moves, group reorders, bulk save
//! - [`services`] - Transactional services used by callers
//! - [`config`] - Environment configuration

pub mod config;
pub mod db;
pub mod hierarchy;
pub mod markup;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::CoreConfig;
pub use db::DatabaseService;
pub use models::*;
pub use services::*;
