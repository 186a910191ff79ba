//! Bulk save of an editing session
//!
//! The editor collects every change to a statute and submits them at once:
//!
//! ```json
//! {
//!   "created": [{"temp_id": "new-1", "level": "chapter", "number": "II",
//!                "name": "Offences", "content": null, "order_no": 2, "parent_id": "14"}],
//!   "updated": [{"id": "15", "level": "section", "name": "Penalty"}],
//!   "deleted": [{"id": "16", "level": "part"}],
//!   "order":   [{"id": "new-1", "order_no": 1}, {"id": "15", "order_no": 2}]
//! }
//! ```
//!
//! Ids are stored ids or the client's temporary ids for nodes created in the
//! same save. The save applies deletes, creates, updates and the order list
//! in that sequence, then renumbers every sibling group of the statute. The
//! response maps each temporary id to its real id.

use crate::db::NodeStore;
use crate::hierarchy::HierarchyTree;
use crate::models::{NewNode, NodeKind, NodeUpdate, ParentRef};
use crate::operations::engine::ReorderEngine;
use crate::operations::error::OperationError;
use crate::operations::renumber::{apply_order, is_in_place, plan_order};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A stored node id or a temporary id assigned by the client
///
/// Accepts JSON numbers and strings; strings that parse as integers are
/// stored ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum NodeRef {
    Existing(i64),
    Temp(String),
}

impl<'de> Deserialize<'de> for NodeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(id) => NodeRef::Existing(id),
            Raw::Text(text) => match text.trim().parse::<i64>() {
                Ok(id) => NodeRef::Existing(id),
                Err(_) => NodeRef::Temp(text),
            },
        })
    }
}

impl From<i64> for NodeRef {
    fn from(id: i64) -> Self {
        NodeRef::Existing(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedNode {
    pub temp_id: String,
    pub level: NodeKind,
    /// Display label (`part_no`, `section_no`, ...)
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub order_no: Option<i64>,
    /// Absent for part-level nodes
    #[serde(default)]
    pub parent_id: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedNode {
    pub id: NodeRef,
    pub level: NodeKind,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl UpdatedNode {
    fn to_update(&self) -> NodeUpdate {
        NodeUpdate {
            label_no: self.number.clone().map(Some),
            name: self.name.clone(),
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedNode {
    pub id: NodeRef,
    #[serde(default)]
    pub level: Option<NodeKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: NodeRef,
    pub order_no: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSaveRequest {
    #[serde(default)]
    pub created: Vec<CreatedNode>,
    #[serde(default)]
    pub updated: Vec<UpdatedNode>,
    #[serde(default)]
    pub deleted: Vec<DeletedNode>,
    #[serde(default)]
    pub order: Vec<OrderEntry>,
}

impl BulkSaveRequest {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.deleted.is_empty()
            && self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSaveResult {
    /// Temporary id to stored id for every created node
    pub id_map: BTreeMap<String, i64>,
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
    /// Sibling groups whose numbering changed
    pub renumbered_groups: usize,
}

fn resolve(reference: &NodeRef, id_map: &BTreeMap<String, i64>) -> Result<i64, OperationError> {
    match reference {
        NodeRef::Existing(id) => Ok(*id),
        NodeRef::Temp(temp_id) => id_map
            .get(temp_id)
            .copied()
            .ok_or_else(|| OperationError::unknown_temp_id(temp_id.clone())),
    }
}

impl<'s, S> ReorderEngine<'s, S>
where
    S: NodeStore + ?Sized,
{
    /// Apply a whole editing session to one statute
    ///
    /// Deleting a node that is already gone is not an error. Updates and
    /// order entries for nodes removed earlier in the same save are skipped.
    pub async fn bulk_save(
        &self,
        statute_id: i64,
        request: &BulkSaveRequest,
    ) -> Result<BulkSaveResult, OperationError> {
        if self.store.get_statute(statute_id).await?.is_none() {
            return Err(OperationError::statute_not_found(statute_id));
        }

        let mut result = BulkSaveResult::default();
        let before = HierarchyTree::load(self.store, statute_id).await?;
        let mut removed: HashSet<i64> = HashSet::new();

        for deleted in &request.deleted {
            let NodeRef::Existing(id) = deleted.id else {
                tracing::debug!("Bulk save: ignoring delete of unsaved node {:?}", deleted.id);
                continue;
            };
            if removed.contains(&id) {
                continue;
            }

            match before.find(id) {
                Some(tree_node) => {
                    if let Some(level) = deleted.level {
                        if level != tree_node.node.kind {
                            return Err(OperationError::kind_mismatch(
                                id,
                                level,
                                tree_node.node.kind,
                            ));
                        }
                    }
                    self.store.delete_node(id).await?;
                    removed.extend(tree_node.subtree_ids());
                    result.deleted += 1;
                }
                None => {
                    if let Some(other) = self.store.get_node(id).await? {
                        return Err(OperationError::wrong_statute(
                            id,
                            statute_id,
                            other.statute_id,
                        ));
                    }
                    tracing::debug!("Bulk save: node {} already deleted", id);
                }
            }
        }

        // Parents before children so temporary parent ids resolve
        let mut creates: Vec<&CreatedNode> = request.created.iter().collect();
        creates.sort_by_key(|created| created.level.depth());

        let mut requested: HashMap<i64, i64> = HashMap::new();
        for created in creates {
            if result.id_map.contains_key(&created.temp_id) {
                return Err(OperationError::duplicate_temp_id(created.temp_id.clone()));
            }

            let parent = match (&created.parent_id, created.level.is_root_level()) {
                (None, true) => ParentRef::Statute(statute_id),
                (Some(_), true) => {
                    return Err(OperationError::parent_mismatch(
                        created.level,
                        "part-level nodes cannot have a parent node",
                    ))
                }
                (Some(reference), false) => ParentRef::Node(resolve(reference, &result.id_map)?),
                (None, false) => {
                    return Err(OperationError::parent_mismatch(
                        created.level,
                        "a parent is required",
                    ))
                }
            };
            if let ParentRef::Node(parent_id) = parent {
                if removed.contains(&parent_id) {
                    return Err(OperationError::parent_mismatch(
                        created.level,
                        format!("parent {} is deleted in the same save", parent_id),
                    ));
                }
            }

            let node = self
                .add_node(&NewNode {
                    statute_id,
                    kind: created.level,
                    parent,
                    label_no: created.number.clone(),
                    name: created.name.clone(),
                    content: created.content.clone(),
                })
                .await?;

            if let Some(order_no) = created.order_no {
                requested.insert(node.id, order_no);
            }
            result.id_map.insert(created.temp_id.clone(), node.id);
            result.created += 1;
        }

        for updated in &request.updated {
            let id = resolve(&updated.id, &result.id_map)?;
            if removed.contains(&id) {
                tracing::debug!("Bulk save: skipping update of deleted node {}", id);
                continue;
            }

            let node = self.require_node(id).await?;
            if node.statute_id != statute_id {
                return Err(OperationError::wrong_statute(id, statute_id, node.statute_id));
            }
            if node.kind != updated.level {
                return Err(OperationError::kind_mismatch(id, updated.level, node.kind));
            }

            let update = updated.to_update();
            update.validate_for(node.kind)?;
            if !update.is_empty() {
                self.store.update_node(id, &update).await?;
                result.updated += 1;
            }
        }

        for entry in &request.order {
            let id = resolve(&entry.id, &result.id_map)?;
            if !removed.contains(&id) {
                requested.insert(id, entry.order_no);
            }
        }

        // Renumber every group of the statute against the requested positions
        let after = HierarchyTree::load(self.store, statute_id).await?;
        for (scope, members) in after.sibling_groups() {
            let plan = plan_order(&members, &requested);
            if is_in_place(&members, &plan) {
                continue;
            }
            apply_order(self.store, &plan).await?;
            result.renumbered_groups += 1;
            tracing::debug!("Renumbered {} group under {:?}", scope.kind, scope.parent());
        }

        tracing::info!(
            "Bulk save for statute {}: {} deleted, {} created, {} updated, {} groups renumbered",
            statute_id,
            result.deleted,
            result.created,
            result.updated,
            result.renumbered_groups
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ref_accepts_numbers_and_strings() {
        let refs: Vec<NodeRef> = serde_json::from_str(r#"[12, "34", "new-5f1c"]"#).unwrap();
        assert_eq!(
            refs,
            vec![
                NodeRef::Existing(12),
                NodeRef::Existing(34),
                NodeRef::Temp("new-5f1c".to_string())
            ]
        );
    }

    #[test]
    fn test_request_parses_editor_payload() {
        let payload = r#"{
            "created": [{"temp_id": "new-1", "level": "chapter", "number": "II",
                         "name": "Offences", "content": null, "order_no": 2, "parent_id": "14"}],
            "updated": [{"id": "15", "level": "section", "name": "Penalty"}],
            "deleted": [{"id": 16, "level": "part"}],
            "order": [{"id": "new-1", "order_no": 1}]
        }"#;
        let request: BulkSaveRequest = serde_json::from_str(payload).unwrap();

        assert_eq!(request.created[0].level, NodeKind::Chapter);
        assert_eq!(request.created[0].parent_id, Some(NodeRef::Existing(14)));
        assert_eq!(request.updated[0].id, NodeRef::Existing(15));
        assert_eq!(request.deleted[0].level, Some(NodeKind::Part));
        assert_eq!(request.order[0].id, NodeRef::Temp("new-1".to_string()));
        assert!(!request.is_empty());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let request: BulkSaveRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());
    }

    #[test]
    fn test_resolve_unknown_temp_id() {
        let id_map = BTreeMap::from([("new-1".to_string(), 40)]);
        assert_eq!(resolve(&NodeRef::Temp("new-1".into()), &id_map).unwrap(), 40);
        assert!(matches!(
            resolve(&NodeRef::Temp("new-2".into()), &id_map),
            Err(OperationError::UnknownTempId { .. })
        ));
    }
}
