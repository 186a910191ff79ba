//! Hierarchy Tree
//!
//! Read model of a statute's two hierarchies. Each level is fetched by
//! parent id in `order_no` order and assembled into nested [`TreeNode`]s;
//! leaves and empty groups carry an empty `children` list.

use crate::db::{DatabaseError, NodeStore};
use crate::models::{Hierarchy, Node, SiblingScope};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Sibling group holding this node's children
    pub fn child_scope(&self) -> Option<SiblingScope> {
        self.node.kind.child_kind().map(|kind| SiblingScope {
            statute_id: self.node.statute_id,
            kind,
            parent_id: Some(self.node.id),
        })
    }

    /// Ids of this node and all of its descendants
    pub fn subtree_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        let mut pending = vec![self];
        while let Some(tree_node) = pending.pop() {
            ids.push(tree_node.node.id);
            pending.extend(tree_node.children.iter());
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyTree {
    pub statute_id: i64,
    pub parts: Vec<TreeNode>,
    pub schedule_parts: Vec<TreeNode>,
}

impl HierarchyTree {
    /// Load both hierarchies of a statute
    pub async fn load<S>(store: &S, statute_id: i64) -> Result<Self, DatabaseError>
    where
        S: NodeStore + ?Sized,
    {
        Ok(Self {
            statute_id,
            parts: load_hierarchy(store, statute_id, Hierarchy::Main).await?,
            schedule_parts: load_hierarchy(store, statute_id, Hierarchy::Schedule).await?,
        })
    }

    pub fn roots(&self, hierarchy: Hierarchy) -> &[TreeNode] {
        match hierarchy {
            Hierarchy::Main => &self.parts,
            Hierarchy::Schedule => &self.schedule_parts,
        }
    }

    /// Every node, depth first: main hierarchy, then schedules
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut ordered = Vec::new();
        for roots in [&self.parts, &self.schedule_parts] {
            let mut pending: Vec<&TreeNode> = roots.iter().rev().collect();
            while let Some(tree_node) = pending.pop() {
                ordered.push(tree_node);
                pending.extend(tree_node.children.iter().rev());
            }
        }
        ordered.into_iter()
    }

    pub fn find(&self, id: i64) -> Option<&TreeNode> {
        self.iter().find(|tree_node| tree_node.node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.schedule_parts.is_empty()
    }

    /// Every non-empty sibling group with its members in current order
    pub fn sibling_groups(&self) -> Vec<(SiblingScope, Vec<&Node>)> {
        let mut groups = Vec::new();

        for hierarchy in [Hierarchy::Main, Hierarchy::Schedule] {
            let roots = self.roots(hierarchy);
            if !roots.is_empty() {
                groups.push((
                    SiblingScope::root(self.statute_id, hierarchy),
                    roots.iter().map(|t| &t.node).collect(),
                ));
            }
        }

        for tree_node in self.iter() {
            if tree_node.children.is_empty() {
                continue;
            }
            if let Some(scope) = tree_node.child_scope() {
                groups.push((scope, tree_node.children.iter().map(|t| &t.node).collect()));
            }
        }

        groups
    }
}

async fn load_hierarchy<S>(
    store: &S,
    statute_id: i64,
    hierarchy: Hierarchy,
) -> Result<Vec<TreeNode>, DatabaseError>
where
    S: NodeStore + ?Sized,
{
    let roots = store
        .children(&SiblingScope::root(statute_id, hierarchy))
        .await?;

    let mut by_parent: HashMap<i64, Vec<Node>> = HashMap::new();
    let mut level: Vec<SiblingScope> = roots
        .iter()
        .filter_map(child_scope_of)
        .collect();

    while !level.is_empty() {
        let mut next_level = Vec::new();
        for scope in level {
            let children = store.children(&scope).await?;
            next_level.extend(children.iter().filter_map(child_scope_of));
            if let Some(parent_id) = scope.parent_id {
                by_parent.insert(parent_id, children);
            }
        }
        level = next_level;
    }

    Ok(roots
        .into_iter()
        .map(|node| assemble(node, &mut by_parent))
        .collect())
}

fn child_scope_of(node: &Node) -> Option<SiblingScope> {
    node.kind.child_kind().map(|kind| SiblingScope {
        statute_id: node.statute_id,
        kind,
        parent_id: Some(node.id),
    })
}

fn assemble(node: Node, by_parent: &mut HashMap<i64, Vec<Node>>) -> TreeNode {
    let children = by_parent
        .remove(&node.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, by_parent))
        .collect();
    TreeNode { node, children }
}
