//! Hierarchy Service
//!
//! Runs every structural edit of a statute hierarchy inside its own
//! transaction: the [`ReorderEngine`] works against the open
//! [`StoreTransaction`](crate::db::StoreTransaction), which is committed
//! when the operation succeeds and rolled back when it fails. Readers never
//! see a half-renumbered group.
//!
//! Also serves the read side: the full hierarchy and the rendered book view.

use crate::db::{ChangeEntry, ChangeTable, DatabaseService, NodeStore};
use crate::hierarchy::{Book, BookRenderer, HierarchyTree};
use crate::markup::AnnotationResolver;
use crate::models::{DeleteResult, NewNode, Node, NodeKind, NodeUpdate, ParentRef};
use crate::operations::{BulkSaveRequest, BulkSaveResult, MoveOutcome, MoveRequest, ReorderEngine};
use crate::services::error::ServiceError;
use crate::services::finish;
use std::sync::Arc;

pub struct HierarchyService {
    db: Arc<DatabaseService>,
}

impl HierarchyService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn get_node(&self, id: i64) -> Result<Node, ServiceError> {
        self.db
            .session()
            .await?
            .get_node(id)
            .await?
            .ok_or_else(|| ServiceError::node_not_found(id))
    }

    pub async fn add_node(&self, node: NewNode) -> Result<Node, ServiceError> {
        let tx = self.db.begin().await?;
        let result = ReorderEngine::new(&*tx).add_node(&node).await;
        finish(tx, result).await
    }

    pub async fn edit_node(&self, id: i64, update: NodeUpdate) -> Result<Node, ServiceError> {
        let tx = self.db.begin().await?;
        let result = ReorderEngine::new(&*tx).edit_node(id, &update).await;
        finish(tx, result).await
    }

    /// Delete a node and its subtree; the gap in its group is closed
    pub async fn delete_node(&self, id: i64) -> Result<DeleteResult, ServiceError> {
        let tx = self.db.begin().await?;
        let result = ReorderEngine::new(&*tx).delete_node(id).await;
        finish(tx, result).await
    }

    pub async fn move_node(&self, request: &MoveRequest) -> Result<MoveOutcome, ServiceError> {
        let tx = self.db.begin().await?;
        let result = ReorderEngine::new(&*tx).move_node(request).await;
        finish(tx, result).await
    }

    pub async fn reorder_children(
        &self,
        parent: ParentRef,
        kind: NodeKind,
        ids: &[i64],
    ) -> Result<Vec<Node>, ServiceError> {
        let tx = self.db.begin().await?;
        let result = ReorderEngine::new(&*tx)
            .reorder_children(parent, kind, ids)
            .await;
        finish(tx, result).await
    }

    /// Apply an editing session; on any failure nothing is written
    pub async fn bulk_save(
        &self,
        statute_id: i64,
        request: &BulkSaveRequest,
    ) -> Result<BulkSaveResult, ServiceError> {
        let tx = self.db.begin().await?;
        let result = ReorderEngine::new(&*tx)
            .bulk_save(statute_id, request)
            .await;
        finish(tx, result).await
    }

    /// Both hierarchies of a statute
    pub async fn load_tree(&self, statute_id: i64) -> Result<HierarchyTree, ServiceError> {
        let session = self.db.session().await?;
        if session.get_statute(statute_id).await?.is_none() {
            return Err(ServiceError::statute_not_found(statute_id));
        }
        Ok(HierarchyTree::load(&session, statute_id).await?)
    }

    /// Render the statute for reading, citations resolved
    ///
    /// If the annotations cannot be loaded the book is rendered with its
    /// text unprocessed.
    pub async fn book(&self, statute_id: i64) -> Result<Book, ServiceError> {
        let session = self.db.session().await?;
        let statute = session
            .get_statute(statute_id)
            .await?
            .ok_or_else(|| ServiceError::statute_not_found(statute_id))?;
        let tree = HierarchyTree::load(&session, statute_id).await?;

        let resolver = AnnotationResolver::new(self.db.clone());
        let table = match resolver.load(statute_id).await {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(
                    "Annotation lookup failed for statute {}; rendering book unprocessed: {}",
                    statute_id,
                    e
                );
                None
            }
        };

        let book = BookRenderer::new(table.as_ref()).render(&statute, &tree);
        tracing::debug!(
            "Rendered statute {} with {} nodes and {} footnotes",
            statute_id,
            tree.node_count(),
            book.footnotes.len()
        );
        Ok(book)
    }

    /// Change log of one node, oldest first
    pub async fn node_history(&self, id: i64) -> Result<Vec<ChangeEntry>, ServiceError> {
        Ok(self
            .db
            .session()
            .await?
            .change_log(ChangeTable::Node, id)
            .await?)
    }
}
