//! NodeStore Trait - Hierarchy Persistence Seam
//!
//! The ordering and tree-loading logic is written against this trait rather
//! than against libsql directly. Every method runs inside whatever
//! transaction the implementor is bound to; the trait itself never begins
//! or commits.
//!
//! # Ordering Contract
//!
//! - `order_no` values below [`PLACEHOLDER_OFFSET`](crate::db::PLACEHOLDER_OFFSET)
//!   are real positions; values at or above it are parked rows mid-renumber.
//! - [`shift_siblings`](NodeStore::shift_siblings) must never trip the
//!   sibling uniqueness constraint, whatever order rows are visited in.

use crate::db::error::DatabaseError;
use crate::models::{NewNode, Node, NodeUpdate, ParentRef, SiblingScope, Statute};
use async_trait::async_trait;

#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn get_statute(&self, id: i64) -> Result<Option<Statute>, DatabaseError>;

    async fn get_node(&self, id: i64) -> Result<Option<Node>, DatabaseError>;

    /// Members of one sibling group, ordered by `order_no` ascending
    async fn children(&self, scope: &SiblingScope) -> Result<Vec<Node>, DatabaseError>;

    /// `max(order_no) + 1` over the real positions of a group, `1` when empty
    async fn next_order_no(&self, scope: &SiblingScope) -> Result<i64, DatabaseError>;

    async fn insert_node(&self, node: &NewNode, order_no: i64) -> Result<Node, DatabaseError>;

    /// Patch text fields; returns `false` when the node does not exist
    async fn update_node(&self, id: i64, update: &NodeUpdate) -> Result<bool, DatabaseError>;

    /// Delete a node and, through the cascade, its whole subtree
    ///
    /// Returns `false` when the node did not exist. Does not close the gap
    /// left in the sibling group.
    async fn delete_node(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Move a node to its placeholder position (`PLACEHOLDER_OFFSET + id`)
    async fn park_node(&self, id: i64) -> Result<(), DatabaseError>;

    async fn set_order(&self, id: i64, order_no: i64) -> Result<(), DatabaseError>;

    /// Re-parent a node and give it its final position
    async fn move_to(&self, id: i64, parent: ParentRef, order_no: i64)
        -> Result<(), DatabaseError>;

    /// Add `delta` to every real position in `scope` at or beyond `from_order`
    ///
    /// With a negative delta, `from_order` must be greater than `-delta` so
    /// no position drops to zero or below.
    async fn shift_siblings(
        &self,
        scope: &SiblingScope,
        from_order: i64,
        delta: i64,
    ) -> Result<u64, DatabaseError>;
}
