//! Annotation Resolver
//!
//! Loads a statute's annotations into an [`AnnotationTable`] and runs the
//! [`MarkupRewriter`] over text on behalf of callers that only hold a
//! statute id.
//!
//! The table is loaded fresh for every call; nothing is cached across calls.
//! If loading fails the input text comes back unchanged and the failure is
//! logged, so rendering never fails because of annotation storage.

use crate::db::{DatabaseError, DatabaseService};
use crate::markup::rewriter::{MarkupRewriter, RewriteOutput};
use crate::models::{annotation_key, Annotation};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Where annotations are loaded from
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    async fn annotations_for(&self, statute_id: i64) -> Result<Vec<Annotation>, DatabaseError>;
}

#[async_trait]
impl AnnotationSource for DatabaseService {
    async fn annotations_for(&self, statute_id: i64) -> Result<Vec<Annotation>, DatabaseError> {
        self.session()
            .await?
            .list_annotations(statute_id, None)
            .await
    }
}

#[async_trait]
impl<T: AnnotationSource + ?Sized> AnnotationSource for Arc<T> {
    async fn annotations_for(&self, statute_id: i64) -> Result<Vec<Annotation>, DatabaseError> {
        (**self).annotations_for(statute_id).await
    }
}

/// Footnote text keyed by `"{no}"` or `"{no}_{page}"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationTable {
    entries: HashMap<String, String>,
}

impl AnnotationTable {
    /// Build a table; for duplicate keys the later annotation wins
    pub fn from_annotations<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> Self {
        let entries = annotations
            .into_iter()
            .map(|a| (a.key(), a.footnote.clone().unwrap_or_default()))
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, no: &str, page: Option<&str>, footnote: impl Into<String>) {
        self.entries
            .insert(annotation_key(no, page), footnote.into());
    }

    /// Footnote for a citation; a page-qualified citation only matches a
    /// page-qualified annotation
    pub fn lookup(&self, no: &str, page: Option<&str>) -> Option<&str> {
        self.entries
            .get(&annotation_key(no, page))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct AnnotationResolver<S> {
    source: S,
}

impl<S: AnnotationSource> AnnotationResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn load(&self, statute_id: i64) -> Result<AnnotationTable, DatabaseError> {
        let annotations = self.source.annotations_for(statute_id).await?;
        tracing::debug!(
            "Loaded {} annotations for statute {}",
            annotations.len(),
            statute_id
        );
        Ok(AnnotationTable::from_annotations(&annotations))
    }

    async fn table_for(&self, text: &str, statute_id: Option<i64>) -> Option<AnnotationTable> {
        let statute_id = statute_id?;
        if text.is_empty() {
            return None;
        }
        match self.load(statute_id).await {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(
                    "Annotation lookup failed for statute {}; rendering text unprocessed: {}",
                    statute_id,
                    e
                );
                None
            }
        }
    }

    /// Rewrite citation markup in `text`, returning only the new text
    ///
    /// Returns `text` unchanged when it is empty, when no statute is given,
    /// or when the annotations cannot be loaded.
    pub async fn process_annotations(&self, text: &str, statute_id: Option<i64>) -> String {
        match self.table_for(text, statute_id).await {
            Some(table) => MarkupRewriter::new(&table).rewrite_text(text),
            None => text.to_string(),
        }
    }

    /// Rewrite citation markup in `text` and collect the cited footnotes
    ///
    /// Same fallbacks as [`process_annotations`](Self::process_annotations),
    /// with an empty footnote list.
    pub async fn process_with_footnotes(&self, text: &str, statute_id: Option<i64>) -> RewriteOutput {
        match self.table_for(text, statute_id).await {
            Some(table) => MarkupRewriter::new(&table).rewrite(text),
            None => RewriteOutput::unchanged(text),
        }
    }
}
