//! Statute Hierarchy Node Model
//!
//! A statute body is a fixed-depth tree of five levels (part, chapter, set,
//! section, subsection). Schedules attached to a statute repeat the same five
//! levels as a parallel hierarchy. Every node of either hierarchy is stored in
//! a single `nodes` table and distinguished by its [`NodeKind`].
//!
//! # Ordering
//!
//! Siblings are ordered by `order_no`. Within one [`SiblingScope`] the values
//! are always the dense sequence `1..=N` once a mutation has committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation errors raised before anything reaches storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node kind: {0}")]
    InvalidKind(String),

    #[error("Field '{field}' is not allowed on {kind} nodes")]
    UnexpectedField { field: String, kind: NodeKind },

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Which of the two parallel hierarchies a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hierarchy {
    Main,
    Schedule,
}

/// The ten node kinds: five levels in the main body, five in the schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Part,
    Chapter,
    Set,
    Section,
    Subsection,
    SchPart,
    SchChapter,
    SchSet,
    SchSection,
    SchSubsection,
}

impl NodeKind {
    pub const MAIN: [NodeKind; 5] = [
        NodeKind::Part,
        NodeKind::Chapter,
        NodeKind::Set,
        NodeKind::Section,
        NodeKind::Subsection,
    ];

    pub const SCHEDULE: [NodeKind; 5] = [
        NodeKind::SchPart,
        NodeKind::SchChapter,
        NodeKind::SchSet,
        NodeKind::SchSection,
        NodeKind::SchSubsection,
    ];

    /// Storage and wire name (`part`, `sch_section`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Part => "part",
            NodeKind::Chapter => "chapter",
            NodeKind::Set => "set",
            NodeKind::Section => "section",
            NodeKind::Subsection => "subsection",
            NodeKind::SchPart => "sch_part",
            NodeKind::SchChapter => "sch_chapter",
            NodeKind::SchSet => "sch_set",
            NodeKind::SchSection => "sch_section",
            NodeKind::SchSubsection => "sch_subsection",
        }
    }

    /// Name of the label field for this kind (`part_no`, `sch_section_no`, ...)
    pub fn label_field(&self) -> String {
        format!("{}_no", self.as_str())
    }

    pub fn hierarchy(&self) -> Hierarchy {
        match self {
            NodeKind::Part
            | NodeKind::Chapter
            | NodeKind::Set
            | NodeKind::Section
            | NodeKind::Subsection => Hierarchy::Main,
            _ => Hierarchy::Schedule,
        }
    }

    /// Zero-based level within its hierarchy (part = 0, subsection = 4)
    pub fn depth(&self) -> usize {
        match self {
            NodeKind::Part | NodeKind::SchPart => 0,
            NodeKind::Chapter | NodeKind::SchChapter => 1,
            NodeKind::Set | NodeKind::SchSet => 2,
            NodeKind::Section | NodeKind::SchSection => 3,
            NodeKind::Subsection | NodeKind::SchSubsection => 4,
        }
    }

    fn levels(&self) -> &'static [NodeKind; 5] {
        match self.hierarchy() {
            Hierarchy::Main => &Self::MAIN,
            Hierarchy::Schedule => &Self::SCHEDULE,
        }
    }

    /// Kind of the required parent node, `None` for part-level kinds whose
    /// parent is the statute itself
    pub fn parent_kind(&self) -> Option<NodeKind> {
        let depth = self.depth();
        (depth > 0).then(|| self.levels()[depth - 1])
    }

    /// Kind of the children, `None` for leaves
    pub fn child_kind(&self) -> Option<NodeKind> {
        self.levels().get(self.depth() + 1).copied()
    }

    pub fn is_root_level(&self) -> bool {
        self.depth() == 0
    }

    pub fn is_leaf(&self) -> bool {
        self.child_kind().is_none()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::MAIN
            .iter()
            .chain(NodeKind::SCHEDULE.iter())
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| ValidationError::InvalidKind(s.to_string()))
    }
}

/// Owner of a node: the statute for part-level kinds, otherwise a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    Statute(i64),
    Node(i64),
}

impl ParentRef {
    /// Node id of the parent, `None` when the parent is the statute
    pub fn node_id(&self) -> Option<i64> {
        match self {
            ParentRef::Statute(_) => None,
            ParentRef::Node(id) => Some(*id),
        }
    }
}

/// Identifies one sibling group: every node sharing kind and parent
///
/// Part-level groups have `parent == None` and are keyed by statute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiblingScope {
    pub statute_id: i64,
    pub kind: NodeKind,
    pub parent_id: Option<i64>,
}

impl SiblingScope {
    pub fn new(statute_id: i64, kind: NodeKind, parent: ParentRef) -> Self {
        Self {
            statute_id,
            kind,
            parent_id: parent.node_id(),
        }
    }

    /// Top-level group of a hierarchy (parts or schedule parts)
    pub fn root(statute_id: i64, hierarchy: Hierarchy) -> Self {
        let kind = match hierarchy {
            Hierarchy::Main => NodeKind::Part,
            Hierarchy::Schedule => NodeKind::SchPart,
        };
        Self {
            statute_id,
            kind,
            parent_id: None,
        }
    }

    pub fn parent(&self) -> ParentRef {
        match self.parent_id {
            Some(id) => ParentRef::Node(id),
            None => ParentRef::Statute(self.statute_id),
        }
    }
}

/// A stored hierarchy node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    pub statute_id: i64,
    pub kind: NodeKind,
    /// `None` for part-level nodes (owned by the statute)
    pub parent_id: Option<i64>,
    pub order_no: i64,
    /// Display label such as "1", "IV" or "A"
    pub label_no: Option<String>,
    pub name: Option<String>,
    /// Body text, present on subsection kinds only
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Node {
    pub fn parent(&self) -> ParentRef {
        match self.parent_id {
            Some(id) => ParentRef::Node(id),
            None => ParentRef::Statute(self.statute_id),
        }
    }

    pub fn scope(&self) -> SiblingScope {
        SiblingScope {
            statute_id: self.statute_id,
            kind: self.kind,
            parent_id: self.parent_id,
        }
    }
}

/// Fields required to create a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub statute_id: i64,
    pub kind: NodeKind,
    pub parent: ParentRef,
    #[serde(default)]
    pub label_no: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl NewNode {
    pub fn new(statute_id: i64, kind: NodeKind, parent: ParentRef) -> Self {
        Self {
            statute_id,
            kind,
            parent,
            label_no: None,
            name: None,
            content: None,
        }
    }

    pub fn with_label(mut self, label_no: impl Into<String>) -> Self {
        self.label_no = Some(label_no.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn scope(&self) -> SiblingScope {
        SiblingScope::new(self.statute_id, self.kind, self.parent)
    }

    /// Check field requirements for the node kind
    ///
    /// Parent existence and parent kind are checked against storage by the
    /// caller; this only covers what can be decided from the value alone.
    ///
    /// # Errors
    ///
    /// - Part-level kinds must be owned by the statute they name
    /// - Other kinds must be owned by a node
    /// - Non-leaf kinds require a non-empty `name` and reject `content`
    /// - Leaf kinds require `content`
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.kind.is_root_level(), self.parent) {
            (true, ParentRef::Statute(id)) if id == self.statute_id => {}
            (true, _) => {
                return Err(ValidationError::InvalidParent(format!(
                    "{} must belong directly to statute {}",
                    self.kind, self.statute_id
                )))
            }
            (false, ParentRef::Node(_)) => {}
            (false, ParentRef::Statute(_)) => {
                return Err(ValidationError::InvalidParent(format!(
                    "{} requires a parent node",
                    self.kind
                )))
            }
        }

        if self.kind.is_leaf() {
            if self.content.is_none() {
                return Err(ValidationError::MissingField("content".to_string()));
            }
        } else {
            if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                return Err(ValidationError::MissingField("name".to_string()));
            }
            if self.content.is_some() {
                return Err(ValidationError::UnexpectedField {
                    field: "content".to_string(),
                    kind: self.kind,
                });
            }
        }

        Ok(())
    }
}

/// Partial update of a node's text fields
///
/// Only `Some` fields change. Position changes go through the reorder
/// operations, never through an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    /// Replace the label; `Some(None)` clears it
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub label_no: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label_no: Option<String>) -> Self {
        self.label_no = Some(label_no);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.label_no.is_none() && self.name.is_none() && self.content.is_none()
    }

    /// Reject fields that do not exist on `kind`
    pub fn validate_for(&self, kind: NodeKind) -> Result<(), ValidationError> {
        if self.content.is_some() && !kind.is_leaf() {
            return Err(ValidationError::UnexpectedField {
                field: "content".to_string(),
                kind,
            });
        }
        if !kind.is_leaf() && self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Result of a delete operation
///
/// Deletes are idempotent; `existed` reports whether anything was removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub existed: bool,
}

impl DeleteResult {
    pub fn existed() -> Self {
        Self { existed: true }
    }

    pub fn not_found() -> Self {
        Self { existed: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_chain_main() {
        assert_eq!(NodeKind::Part.parent_kind(), None);
        assert_eq!(NodeKind::Part.child_kind(), Some(NodeKind::Chapter));
        assert_eq!(NodeKind::Section.parent_kind(), Some(NodeKind::Set));
        assert_eq!(NodeKind::Subsection.child_kind(), None);
        assert!(NodeKind::Subsection.is_leaf());
    }

    #[test]
    fn test_kind_chain_schedule_stays_in_schedule() {
        assert_eq!(NodeKind::SchChapter.parent_kind(), Some(NodeKind::SchPart));
        assert_eq!(NodeKind::SchSet.child_kind(), Some(NodeKind::SchSection));
        assert_eq!(NodeKind::SchPart.hierarchy(), Hierarchy::Schedule);
        assert!(NodeKind::SchPart.is_root_level());
    }

    #[test]
    fn test_kind_names_round_trip_through_from_str() {
        for kind in NodeKind::MAIN.iter().chain(NodeKind::SCHEDULE.iter()) {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), *kind);
        }
        assert_eq!(NodeKind::SchSection.label_field(), "sch_section_no");
        assert!("paragraph".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&NodeKind::SchSubsection).unwrap();
        assert_eq!(json, "\"sch_subsection\"");
    }

    #[test]
    fn test_new_node_validation() {
        let part = NewNode::new(1, NodeKind::Part, ParentRef::Statute(1)).with_name("General");
        assert!(part.validate().is_ok());

        let nameless = NewNode::new(1, NodeKind::Part, ParentRef::Statute(1));
        assert_eq!(
            nameless.validate(),
            Err(ValidationError::MissingField("name".to_string()))
        );

        let wrong_statute =
            NewNode::new(1, NodeKind::Part, ParentRef::Statute(2)).with_name("General");
        assert!(matches!(
            wrong_statute.validate(),
            Err(ValidationError::InvalidParent(_))
        ));

        let orphan = NewNode::new(1, NodeKind::Chapter, ParentRef::Statute(1)).with_name("x");
        assert!(matches!(
            orphan.validate(),
            Err(ValidationError::InvalidParent(_))
        ));

        let empty_leaf = NewNode::new(1, NodeKind::Subsection, ParentRef::Node(9));
        assert_eq!(
            empty_leaf.validate(),
            Err(ValidationError::MissingField("content".to_string()))
        );

        let blank_leaf = NewNode::new(1, NodeKind::Subsection, ParentRef::Node(9)).with_content("");
        assert!(blank_leaf.validate().is_ok(), "present but empty content is allowed");
    }

    #[test]
    fn test_update_rejects_content_on_non_leaf() {
        let update = NodeUpdate::new().with_content("text");
        assert!(update.validate_for(NodeKind::SchSubsection).is_ok());
        assert!(update.validate_for(NodeKind::Chapter).is_err());
    }

    #[test]
    fn test_update_double_option_label() {
        let cleared: NodeUpdate = serde_json::from_str(r#"{"labelNo": null}"#).unwrap();
        assert_eq!(cleared.label_no, Some(None));

        let untouched: NodeUpdate = serde_json::from_str(r#"{"name": "New"}"#).unwrap();
        assert_eq!(untouched.label_no, None);
        assert!(!untouched.is_empty());
    }

    #[test]
    fn test_scope_parent_round_trip() {
        let scope = SiblingScope::new(4, NodeKind::Part, ParentRef::Statute(4));
        assert_eq!(scope, SiblingScope::root(4, Hierarchy::Main));
        assert_eq!(scope.parent(), ParentRef::Statute(4));

        let scope = SiblingScope::new(4, NodeKind::Section, ParentRef::Node(12));
        assert_eq!(scope.parent(), ParentRef::Node(12));
    }
}
