//! Book View
//!
//! Renders a whole statute for reading: the preface and every node's label,
//! name and content go through the citation rewriter, and the footnotes
//! cited along the way are collected per node and for the whole book.
//!
//! Label and name fields holding the pseudo sentinel are passed through
//! untouched. Without an annotation table (storage failure) every field is
//! passed through untouched.

use crate::hierarchy::tree::{HierarchyTree, TreeNode};
use crate::markup::{AnnotationTable, Footnote, MarkupRewriter, RewriteOutput};
use crate::models::{NodeKind, Statute};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNode {
    pub id: i64,
    pub kind: NodeKind,
    pub order_no: i64,
    pub label_no: Option<String>,
    pub name: Option<String>,
    pub content: Option<String>,
    /// Footnotes cited by this node's own fields
    pub footnotes: Vec<Footnote>,
    pub children: Vec<RenderedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub statute: Statute,
    pub preface: Option<String>,
    pub parts: Vec<RenderedNode>,
    pub schedule_parts: Vec<RenderedNode>,
    /// Every footnote in reading order
    pub footnotes: Vec<Footnote>,
}

pub struct BookRenderer<'t> {
    rewriter: Option<MarkupRewriter<'t>>,
}

impl<'t> BookRenderer<'t> {
    pub fn new(table: Option<&'t AnnotationTable>) -> Self {
        Self {
            rewriter: table.map(MarkupRewriter::new),
        }
    }

    pub fn render(&self, statute: &Statute, tree: &HierarchyTree) -> Book {
        let mut footnotes = Vec::new();

        let preface = statute
            .preface
            .as_deref()
            .map(|text| self.text(text, &mut footnotes));
        let parts = self.render_all(&tree.parts, &mut footnotes);
        let schedule_parts = self.render_all(&tree.schedule_parts, &mut footnotes);

        Book {
            statute: statute.clone(),
            preface,
            parts,
            schedule_parts,
            footnotes,
        }
    }

    fn render_all(&self, nodes: &[TreeNode], book_notes: &mut Vec<Footnote>) -> Vec<RenderedNode> {
        nodes
            .iter()
            .map(|tree_node| self.render_node(tree_node, book_notes))
            .collect()
    }

    fn render_node(&self, tree_node: &TreeNode, book_notes: &mut Vec<Footnote>) -> RenderedNode {
        let node = &tree_node.node;
        let mut footnotes = Vec::new();

        let label_no = node
            .label_no
            .as_deref()
            .map(|label| self.field(label, &mut footnotes));
        let name = node
            .name
            .as_deref()
            .map(|name| self.field(name, &mut footnotes));
        let content = node
            .content
            .as_deref()
            .map(|content| self.text(content, &mut footnotes));

        book_notes.extend(footnotes.iter().cloned());
        let children = self.render_all(&tree_node.children, book_notes);

        RenderedNode {
            id: node.id,
            kind: node.kind,
            order_no: node.order_no,
            label_no,
            name,
            content,
            footnotes,
            children,
        }
    }

    fn field(&self, value: &str, footnotes: &mut Vec<Footnote>) -> String {
        self.collect(
            self.rewriter.as_ref().map(|r| r.rewrite_field(value)),
            value,
            footnotes,
        )
    }

    fn text(&self, value: &str, footnotes: &mut Vec<Footnote>) -> String {
        self.collect(
            self.rewriter.as_ref().map(|r| r.rewrite(value)),
            value,
            footnotes,
        )
    }

    fn collect(
        &self,
        output: Option<RewriteOutput>,
        original: &str,
        footnotes: &mut Vec<Footnote>,
    ) -> String {
        match output {
            Some(output) => {
                footnotes.extend(output.footnotes);
                output.text
            }
            None => original.to_string(),
        }
    }
}
