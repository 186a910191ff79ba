//! Statute hierarchy read models: the loaded tree and its rendered book view

mod book;
mod tree;

pub use book::{Book, BookRenderer, RenderedNode};
pub use tree::{HierarchyTree, TreeNode};
