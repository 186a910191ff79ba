//! Statute Service
//!
//! CRUD for statutes. Names are unique; act numbers are unique when given.
//! Deleting a statute removes both hierarchies and the annotation table
//! through the foreign key cascade.
//!
//! Writes run in a transaction together with their change-log entry.

use crate::db::{DatabaseError, DatabaseService, Session};
use crate::models::{DeleteResult, NewStatute, Statute, StatuteUpdate};
use crate::services::error::ServiceError;
use crate::services::finish;
use std::sync::Arc;

pub struct StatuteService {
    db: Arc<DatabaseService>,
}

/// Map a UNIQUE failure on insert/update to the matching duplicate error
fn duplicate_or(
    e: DatabaseError,
    name: Option<&str>,
    act_no: Option<&str>,
) -> ServiceError {
    if !e.is_unique_violation() {
        return e.into();
    }
    let message = e.to_string();
    match (name, act_no) {
        (_, Some(act_no)) if message.contains("statutes.act_no") => {
            ServiceError::duplicate_act_no(act_no)
        }
        (Some(name), _) => ServiceError::duplicate_statute(name),
        _ => e.into(),
    }
}

impl StatuteService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create(&self, statute: NewStatute) -> Result<Statute, ServiceError> {
        statute.validate()?;
        let tx = self.db.begin().await?;
        let result = insert_statute(&tx, &statute).await;
        let created = finish(tx, result).await?;

        tracing::info!("Created statute {} '{}'", created.id, created.name);
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Statute, ServiceError> {
        self.db
            .session()
            .await?
            .get_statute(id)
            .await?
            .ok_or_else(|| ServiceError::statute_not_found(id))
    }

    /// Most recently modified first; `search` matches name or act number
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Statute>, ServiceError> {
        Ok(self.db.session().await?.list_statutes(search).await?)
    }

    pub async fn update(&self, id: i64, update: StatuteUpdate) -> Result<Statute, ServiceError> {
        update.validate()?;
        let tx = self.db.begin().await?;
        let result = update_statute(&tx, id, &update).await;
        finish(tx, result).await
    }

    pub async fn delete(&self, id: i64) -> Result<DeleteResult, ServiceError> {
        let tx = self.db.begin().await?;
        let result = tx.delete_statute(id).await;
        let existed = finish(tx, result).await?;
        if existed {
            tracing::info!("Deleted statute {} with its hierarchy and annotations", id);
        }
        Ok(DeleteResult { existed })
    }
}

async fn insert_statute(session: &Session, statute: &NewStatute) -> Result<Statute, ServiceError> {
    if session.find_statute_by_name(&statute.name).await?.is_some() {
        return Err(ServiceError::duplicate_statute(statute.name.trim()));
    }

    session
        .insert_statute(statute)
        .await
        .map_err(|e| duplicate_or(e, Some(statute.name.trim()), statute.act_no.as_deref()))
}

async fn update_statute(
    session: &Session,
    id: i64,
    update: &StatuteUpdate,
) -> Result<Statute, ServiceError> {
    if let Some(name) = &update.name {
        if let Some(existing) = session.find_statute_by_name(name).await? {
            if existing.id != id {
                return Err(ServiceError::duplicate_statute(name.trim()));
            }
        }
    }

    let act_no = update.act_no.clone().flatten();
    let found = session
        .update_statute(id, update)
        .await
        .map_err(|e| duplicate_or(e, update.name.as_deref(), act_no.as_deref()))?;
    if !found {
        return Err(ServiceError::statute_not_found(id));
    }

    session
        .get_statute(id)
        .await?
        .ok_or_else(|| ServiceError::statute_not_found(id))
}
