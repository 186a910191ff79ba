//! Hierarchy Operations
//!
//! Structural edits of a statute's hierarchy. [`ReorderEngine`] works
//! against any [`NodeStore`](crate::db::NodeStore); services bind it to a
//! [`StoreTransaction`](crate::db::StoreTransaction) so every operation is
//! all-or-nothing.

mod bulk_save;
mod engine;
mod error;
mod renumber;

pub use bulk_save::{
    BulkSaveRequest, BulkSaveResult, CreatedNode, DeletedNode, NodeRef, OrderEntry, UpdatedNode,
};
pub use engine::{MoveOutcome, MoveRequest, ReorderEngine};
pub use error::OperationError;
pub use renumber::plan_order;
