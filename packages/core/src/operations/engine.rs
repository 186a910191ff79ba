//! Reorder Engine
//!
//! Structural mutations of a statute hierarchy: adding, editing and deleting
//! nodes, moving a node to a new position, reordering one sibling group, and
//! the batched save of a whole editing session.
//!
//! # Architecture
//!
//! The engine borrows a [`NodeStore`] bound to an open transaction and never
//! commits; the caller commits when an operation returns `Ok` and rolls back
//! otherwise. Every operation leaves each sibling group numbered `1..=N`.

use crate::db::NodeStore;
use crate::models::{
    DeleteResult, NewNode, Node, NodeKind, NodeUpdate, ParentRef, SiblingScope,
};
use crate::operations::error::OperationError;
use crate::operations::renumber::{apply_order, is_in_place, plan_order};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Move one node to `new_index` (zero-based) among the children of `new_parent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub node_id: i64,
    /// Kind the caller believes the node has
    pub kind: NodeKind,
    pub new_parent: ParentRef,
    pub new_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum MoveOutcome {
    /// The node already sat at the requested position
    Unchanged,
    Moved {
        from: SiblingScope,
        from_order: i64,
        to: SiblingScope,
        to_order: i64,
    },
}

pub struct ReorderEngine<'s, S: ?Sized> {
    pub(crate) store: &'s S,
}

impl<'s, S> ReorderEngine<'s, S>
where
    S: NodeStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub(crate) async fn require_node(&self, id: i64) -> Result<Node, OperationError> {
        self.store
            .get_node(id)
            .await?
            .ok_or_else(|| OperationError::node_not_found(id))
    }

    /// Check that `parent` may own a node of `kind` in `statute_id`
    pub(crate) async fn check_parent(
        &self,
        kind: NodeKind,
        statute_id: i64,
        parent: ParentRef,
    ) -> Result<(), OperationError> {
        match (kind.parent_kind(), parent) {
            (None, ParentRef::Statute(id)) if id == statute_id => Ok(()),
            (None, _) => Err(OperationError::parent_mismatch(
                kind,
                format!("{} nodes belong directly to statute {}", kind, statute_id),
            )),
            (Some(expected), ParentRef::Statute(_)) => Err(OperationError::parent_mismatch(
                kind,
                format!("expected a {} parent, got the statute", expected),
            )),
            (Some(expected), ParentRef::Node(parent_id)) => {
                let parent_node = self.require_node(parent_id).await?;
                if parent_node.statute_id != statute_id {
                    return Err(OperationError::wrong_statute(
                        parent_id,
                        statute_id,
                        parent_node.statute_id,
                    ));
                }
                if parent_node.kind != expected {
                    return Err(OperationError::parent_mismatch(
                        kind,
                        format!(
                            "expected a {} parent, node {} is a {}",
                            expected, parent_id, parent_node.kind
                        ),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Create a node at the end of its sibling group
    pub async fn add_node(&self, new_node: &NewNode) -> Result<Node, OperationError> {
        new_node.validate()?;
        if self.store.get_statute(new_node.statute_id).await?.is_none() {
            return Err(OperationError::statute_not_found(new_node.statute_id));
        }
        self.check_parent(new_node.kind, new_node.statute_id, new_node.parent)
            .await?;

        let order_no = self.store.next_order_no(&new_node.scope()).await?;
        let node = self.store.insert_node(new_node, order_no).await?;

        tracing::debug!("Added {} {} at position {}", node.kind, node.id, order_no);
        Ok(node)
    }

    /// Patch a node's label, name or content
    pub async fn edit_node(&self, id: i64, update: &NodeUpdate) -> Result<Node, OperationError> {
        let node = self.require_node(id).await?;
        update.validate_for(node.kind)?;

        if update.is_empty() {
            return Ok(node);
        }
        self.store.update_node(id, update).await?;
        self.require_node(id).await
    }

    /// Delete a node with its subtree and close the gap in its group
    pub async fn delete_node(&self, id: i64) -> Result<DeleteResult, OperationError> {
        let Some(node) = self.store.get_node(id).await? else {
            return Ok(DeleteResult::not_found());
        };

        self.store.delete_node(id).await?;
        self.store
            .shift_siblings(&node.scope(), node.order_no + 1, -1)
            .await?;

        tracing::debug!("Deleted {} {} from position {}", node.kind, id, node.order_no);
        Ok(DeleteResult::existed())
    }

    /// Move a single node, within its group or to another parent
    ///
    /// An index past the end of the target group appends.
    pub async fn move_node(&self, request: &MoveRequest) -> Result<MoveOutcome, OperationError> {
        let node = self.require_node(request.node_id).await?;
        if node.kind != request.kind {
            return Err(OperationError::kind_mismatch(
                node.id,
                request.kind,
                node.kind,
            ));
        }
        self.check_parent(node.kind, node.statute_id, request.new_parent)
            .await?;

        let from = node.scope();
        let to = SiblingScope::new(node.statute_id, node.kind, request.new_parent);

        let mut target_len = self.store.children(&to).await?.len();
        if from == to {
            target_len = target_len.saturating_sub(1);
        }
        let to_order = request.new_index.min(target_len) as i64 + 1;

        if from == to && to_order == node.order_no {
            tracing::debug!("Node {} already at position {}", node.id, to_order);
            return Ok(MoveOutcome::Unchanged);
        }

        // Park, close the old gap, open the new slot, then land
        self.store.park_node(node.id).await?;
        self.store
            .shift_siblings(&from, node.order_no + 1, -1)
            .await?;
        self.store.shift_siblings(&to, to_order, 1).await?;
        self.store
            .move_to(node.id, request.new_parent, to_order)
            .await?;

        tracing::info!(
            "Moved {} {} from position {} to position {} under {:?}",
            node.kind,
            node.id,
            node.order_no,
            to_order,
            request.new_parent
        );
        Ok(MoveOutcome::Moved {
            from,
            from_order: node.order_no,
            to,
            to_order,
        })
    }

    /// Renumber the `kind` children of `parent` in the order of `ids`
    ///
    /// Children not listed keep their relative order after the listed ones.
    pub async fn reorder_children(
        &self,
        parent: ParentRef,
        kind: NodeKind,
        ids: &[i64],
    ) -> Result<Vec<Node>, OperationError> {
        let statute_id = match parent {
            ParentRef::Statute(id) => {
                if self.store.get_statute(id).await?.is_none() {
                    return Err(OperationError::statute_not_found(id));
                }
                id
            }
            ParentRef::Node(id) => self.require_node(id).await?.statute_id,
        };
        self.check_parent(kind, statute_id, parent).await?;

        let scope = SiblingScope::new(statute_id, kind, parent);
        let children = self.store.children(&scope).await?;
        let members: Vec<&Node> = children.iter().collect();
        let member_ids: HashSet<i64> = children.iter().map(|n| n.id).collect();

        let mut requested = HashMap::new();
        for (id, position) in ids.iter().zip(1i64..) {
            if !member_ids.contains(id) {
                return Err(OperationError::invalid_request(format!(
                    "node {} is not a {} child of {:?}",
                    id, kind, parent
                )));
            }
            if requested.insert(*id, position).is_some() {
                return Err(OperationError::invalid_request(format!(
                    "node {} listed twice",
                    id
                )));
            }
        }
        let listed = ids.len() as i64;
        for node in &children {
            requested
                .entry(node.id)
                .or_insert(listed + node.order_no);
        }

        let plan = plan_order(&members, &requested);
        if !is_in_place(&members, &plan) {
            apply_order(self.store, &plan).await?;
        }

        Ok(self.store.children(&scope).await?)
    }
}
