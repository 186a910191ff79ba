//! Annotation Service
//!
//! Maintains a statute's annotation table, the footnotes that citation
//! markup in node text refers to.

use crate::db::{DatabaseService, Session};
use crate::models::{Annotation, AnnotationUpdate, DeleteResult, NewAnnotation};
use crate::services::error::ServiceError;
use crate::services::finish;
use std::sync::Arc;

pub struct AnnotationService {
    db: Arc<DatabaseService>,
}

impl AnnotationService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn add(&self, annotation: NewAnnotation) -> Result<Annotation, ServiceError> {
        annotation.validate()?;
        let tx = self.db.begin().await?;
        let result = insert_annotation(&tx, &annotation).await;
        let created = finish(tx, result).await?;

        tracing::debug!(
            "Added annotation {} ({}) to statute {}",
            created.id,
            created.key(),
            created.statute_id
        );
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Annotation, ServiceError> {
        self.db
            .session()
            .await?
            .get_annotation(id)
            .await?
            .ok_or_else(|| ServiceError::annotation_not_found(id))
    }

    pub async fn edit(
        &self,
        id: i64,
        update: AnnotationUpdate,
    ) -> Result<Annotation, ServiceError> {
        update.validate()?;
        let tx = self.db.begin().await?;
        let result = update_annotation(&tx, id, &update).await;
        finish(tx, result).await
    }

    pub async fn delete(&self, id: i64) -> Result<DeleteResult, ServiceError> {
        let tx = self.db.begin().await?;
        let result = tx.delete_annotation(id).await;
        let existed = finish(tx, result).await?;
        Ok(DeleteResult { existed })
    }

    /// Annotations of one statute ordered by number
    ///
    /// `search` matches number, page or footnote text, ignoring case.
    pub async fn list(
        &self,
        statute_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Annotation>, ServiceError> {
        Ok(self
            .db
            .session()
            .await?
            .list_annotations(statute_id, search)
            .await?)
    }
}

async fn insert_annotation(
    session: &Session,
    annotation: &NewAnnotation,
) -> Result<Annotation, ServiceError> {
    if session.get_statute(annotation.statute_id).await?.is_none() {
        return Err(ServiceError::statute_not_found(annotation.statute_id));
    }
    Ok(session.insert_annotation(annotation).await?)
}

async fn update_annotation(
    session: &Session,
    id: i64,
    update: &AnnotationUpdate,
) -> Result<Annotation, ServiceError> {
    if !session.update_annotation(id, update).await? {
        return Err(ServiceError::annotation_not_found(id));
    }
    session
        .get_annotation(id)
        .await?
        .ok_or_else(|| ServiceError::annotation_not_found(id))
}
