//! Session - SQL Operations over One Connection
//!
//! A `Session` owns a single libsql connection and carries every query the
//! crate issues. Used directly it runs in autocommit mode; wrapped in a
//! [`StoreTransaction`](crate::db::StoreTransaction) the same calls run
//! inside one `BEGIN IMMEDIATE ... COMMIT` block.
//!
//! # Sibling Renumbering
//!
//! SQLite checks UNIQUE indexes row by row, so `order_no = order_no + 1`
//! over a group collides with the next sibling. Shifts therefore write the
//! shifted values negated first and flip the sign in a second statement;
//! negative values never meet the positive ones still in place.

use crate::db::change_log::{ChangeAction, ChangeEntry, ChangeTable};
use crate::db::database::PLACEHOLDER_OFFSET;
use crate::db::error::DatabaseError;
use crate::db::node_store::NodeStore;
use crate::db::rows::{
    parse_timestamp, row_to_annotation, row_to_node, row_to_statute, ANNOTATION_COLUMNS,
    NODE_COLUMNS, STATUTE_COLUMNS,
};
use crate::models::{
    Annotation, AnnotationUpdate, NewAnnotation, NewNode, NewStatute, Node, NodeUpdate,
    ParentRef, SiblingScope, Statute, StatuteUpdate,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use libsql::params::Params;
use libsql::{Row, Value};

pub struct Session {
    conn: libsql::Connection,
}

fn text(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::Text(v.to_string()),
        None => Value::Null,
    }
}

fn integer(value: Option<i64>) -> Value {
    match value {
        Some(v) => Value::Integer(v),
        None => Value::Null,
    }
}

fn date_value(value: Option<NaiveDate>) -> Value {
    match value {
        Some(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        None => Value::Null,
    }
}

fn like_pattern(term: &str) -> Value {
    Value::Text(format!("%{}%", term.trim()))
}

/// WHERE clause selecting one sibling group; binds three parameters
const SCOPE_FILTER: &str = "statute_id = ? AND kind = ? AND parent_id IS ?";

fn scope_values(scope: &SiblingScope) -> Vec<Value> {
    vec![
        Value::Integer(scope.statute_id),
        Value::Text(scope.kind.as_str().to_string()),
        integer(scope.parent_id),
    ]
}

impl Session {
    pub(crate) fn new(conn: libsql::Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, for statements this module does not cover
    pub fn connection(&self) -> &libsql::Connection {
        &self.conn
    }

    pub(crate) async fn execute(
        &self,
        sql: &str,
        params: Params,
        context: &str,
    ) -> Result<u64, DatabaseError> {
        self.conn
            .execute(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to {}: {}", context, e)))
    }

    async fn query_all<T>(
        &self,
        sql: &str,
        params: Params,
        context: &str,
        map: fn(&Row) -> Result<T, DatabaseError>,
    ) -> Result<Vec<T>, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to {}: {}", context, e)))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to {}: {}", context, e)))?
        {
            items.push(map(&row)?);
        }
        Ok(items)
    }

    async fn query_one<T>(
        &self,
        sql: &str,
        params: Params,
        context: &str,
        map: fn(&Row) -> Result<T, DatabaseError>,
    ) -> Result<Option<T>, DatabaseError> {
        Ok(self
            .query_all(sql, params, context, map)
            .await?
            .into_iter()
            .next())
    }

    //
    // CHANGE LOG
    //

    pub(crate) async fn log_change(
        &self,
        table: ChangeTable,
        record_id: i64,
        action: ChangeAction,
    ) -> Result<(), DatabaseError> {
        self.execute(
            "INSERT INTO change_log (table_name, record_id, action) VALUES (?, ?, ?)",
            Params::Positional(vec![
                Value::Text(table.as_str().to_string()),
                Value::Integer(record_id),
                Value::Text(action.as_str().to_string()),
            ]),
            "write change log",
        )
        .await?;
        Ok(())
    }

    /// Change log entries for one record, oldest first
    pub async fn change_log(
        &self,
        table: ChangeTable,
        record_id: i64,
    ) -> Result<Vec<ChangeEntry>, DatabaseError> {
        self.query_all(
            "SELECT id, table_name, record_id, action, created_at FROM change_log
             WHERE table_name = ? AND record_id = ? ORDER BY id",
            Params::Positional(vec![
                Value::Text(table.as_str().to_string()),
                Value::Integer(record_id),
            ]),
            "read change log",
            |row| {
                let action: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok(ChangeEntry {
                    id: row.get(0)?,
                    table_name: row.get(1)?,
                    record_id: row.get(2)?,
                    action: ChangeAction::parse(&action).ok_or_else(|| {
                        DatabaseError::row_conversion(format!("Unknown change action '{}'", action))
                    })?,
                    created_at: parse_timestamp(&created_at)?,
                })
            },
        )
        .await
    }

    //
    // STATUTES
    //

    pub async fn insert_statute(&self, statute: &NewStatute) -> Result<Statute, DatabaseError> {
        let created = self
            .query_one(
                &format!(
                    "INSERT INTO statutes (name, act_no, date, preface) VALUES (?, ?, ?, ?)
                     RETURNING {}",
                    STATUTE_COLUMNS
                ),
                Params::Positional(vec![
                    Value::Text(statute.name.trim().to_string()),
                    text(statute.act_no.as_deref()),
                    date_value(statute.date),
                    text(statute.preface.as_deref()),
                ]),
                "insert statute",
                row_to_statute,
            )
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Statute insert returned no row"))?;

        self.log_change(ChangeTable::Statute, created.id, ChangeAction::Insert)
            .await?;
        Ok(created)
    }

    pub async fn get_statute(&self, id: i64) -> Result<Option<Statute>, DatabaseError> {
        self.query_one(
            &format!("SELECT {} FROM statutes WHERE id = ?", STATUTE_COLUMNS),
            Params::Positional(vec![Value::Integer(id)]),
            "get statute",
            row_to_statute,
        )
        .await
    }

    pub async fn find_statute_by_name(&self, name: &str) -> Result<Option<Statute>, DatabaseError> {
        self.query_one(
            &format!("SELECT {} FROM statutes WHERE name = ?", STATUTE_COLUMNS),
            Params::Positional(vec![Value::Text(name.trim().to_string())]),
            "find statute by name",
            row_to_statute,
        )
        .await
    }

    /// Statutes, most recently modified first, optionally filtered by a
    /// case-insensitive match on name or act number
    pub async fn list_statutes(&self, search: Option<&str>) -> Result<Vec<Statute>, DatabaseError> {
        match search.filter(|s| !s.trim().is_empty()) {
            Some(term) => {
                self.query_all(
                    &format!(
                        "SELECT {} FROM statutes WHERE name LIKE ?1 OR act_no LIKE ?1
                         ORDER BY modified_at DESC, id DESC",
                        STATUTE_COLUMNS
                    ),
                    Params::Positional(vec![like_pattern(term)]),
                    "search statutes",
                    row_to_statute,
                )
                .await
            }
            None => {
                self.query_all(
                    &format!(
                        "SELECT {} FROM statutes ORDER BY modified_at DESC, id DESC",
                        STATUTE_COLUMNS
                    ),
                    Params::None,
                    "list statutes",
                    row_to_statute,
                )
                .await
            }
        }
    }

    pub async fn update_statute(
        &self,
        id: i64,
        update: &StatuteUpdate,
    ) -> Result<bool, DatabaseError> {
        let mut sets = Vec::new();
        let mut values = Vec::new();

        if let Some(name) = &update.name {
            sets.push("name = ?");
            values.push(Value::Text(name.trim().to_string()));
        }
        if let Some(act_no) = &update.act_no {
            sets.push("act_no = ?");
            values.push(text(act_no.as_deref()));
        }
        if let Some(date) = update.date {
            sets.push("date = ?");
            values.push(date_value(date));
        }
        if let Some(preface) = &update.preface {
            sets.push("preface = ?");
            values.push(text(preface.as_deref()));
        }
        if sets.is_empty() {
            return Ok(self.get_statute(id).await?.is_some());
        }

        values.push(Value::Integer(id));
        let sql = format!(
            "UPDATE statutes SET {}, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
            sets.join(", ")
        );
        let affected = self
            .execute(&sql, Params::Positional(values), "update statute")
            .await?;

        if affected > 0 {
            self.log_change(ChangeTable::Statute, id, ChangeAction::Update)
                .await?;
        }
        Ok(affected > 0)
    }

    /// Delete a statute; nodes and annotations go with it through the
    /// foreign key cascade
    pub async fn delete_statute(&self, id: i64) -> Result<bool, DatabaseError> {
        let affected = self
            .execute(
                "DELETE FROM statutes WHERE id = ?",
                Params::Positional(vec![Value::Integer(id)]),
                "delete statute",
            )
            .await?;

        if affected > 0 {
            self.log_change(ChangeTable::Statute, id, ChangeAction::Delete)
                .await?;
        }
        Ok(affected > 0)
    }

    //
    // ANNOTATIONS
    //

    pub async fn insert_annotation(
        &self,
        annotation: &NewAnnotation,
    ) -> Result<Annotation, DatabaseError> {
        let created = self
            .query_one(
                &format!(
                    "INSERT INTO annotations (statute_id, no, page_no, footnote) VALUES (?, ?, ?, ?)
                     RETURNING {}",
                    ANNOTATION_COLUMNS
                ),
                Params::Positional(vec![
                    Value::Integer(annotation.statute_id),
                    Value::Text(annotation.no.trim().to_string()),
                    text(annotation.page_no.as_deref()),
                    text(annotation.footnote.as_deref()),
                ]),
                "insert annotation",
                row_to_annotation,
            )
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Annotation insert returned no row"))?;

        self.log_change(ChangeTable::Annotation, created.id, ChangeAction::Insert)
            .await?;
        Ok(created)
    }

    pub async fn get_annotation(&self, id: i64) -> Result<Option<Annotation>, DatabaseError> {
        self.query_one(
            &format!("SELECT {} FROM annotations WHERE id = ?", ANNOTATION_COLUMNS),
            Params::Positional(vec![Value::Integer(id)]),
            "get annotation",
            row_to_annotation,
        )
        .await
    }

    /// Annotations of one statute ordered by number, optionally filtered by
    /// a case-insensitive match on number, page or footnote text
    pub async fn list_annotations(
        &self,
        statute_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Annotation>, DatabaseError> {
        match search.filter(|s| !s.trim().is_empty()) {
            Some(term) => {
                self.query_all(
                    &format!(
                        "SELECT {} FROM annotations
                         WHERE statute_id = ?1 AND (no LIKE ?2 OR page_no LIKE ?2 OR footnote LIKE ?2)
                         ORDER BY no, id",
                        ANNOTATION_COLUMNS
                    ),
                    Params::Positional(vec![Value::Integer(statute_id), like_pattern(term)]),
                    "search annotations",
                    row_to_annotation,
                )
                .await
            }
            None => {
                self.query_all(
                    &format!(
                        "SELECT {} FROM annotations WHERE statute_id = ? ORDER BY no, id",
                        ANNOTATION_COLUMNS
                    ),
                    Params::Positional(vec![Value::Integer(statute_id)]),
                    "list annotations",
                    row_to_annotation,
                )
                .await
            }
        }
    }

    pub async fn update_annotation(
        &self,
        id: i64,
        update: &AnnotationUpdate,
    ) -> Result<bool, DatabaseError> {
        let mut sets = Vec::new();
        let mut values = Vec::new();

        if let Some(no) = &update.no {
            sets.push("no = ?");
            values.push(Value::Text(no.trim().to_string()));
        }
        if let Some(page_no) = &update.page_no {
            sets.push("page_no = ?");
            values.push(text(page_no.as_deref()));
        }
        if let Some(footnote) = &update.footnote {
            sets.push("footnote = ?");
            values.push(text(footnote.as_deref()));
        }
        if sets.is_empty() {
            return Ok(self.get_annotation(id).await?.is_some());
        }

        values.push(Value::Integer(id));
        let sql = format!(
            "UPDATE annotations SET {}, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
            sets.join(", ")
        );
        let affected = self
            .execute(&sql, Params::Positional(values), "update annotation")
            .await?;

        if affected > 0 {
            self.log_change(ChangeTable::Annotation, id, ChangeAction::Update)
                .await?;
        }
        Ok(affected > 0)
    }

    pub async fn delete_annotation(&self, id: i64) -> Result<bool, DatabaseError> {
        let affected = self
            .execute(
                "DELETE FROM annotations WHERE id = ?",
                Params::Positional(vec![Value::Integer(id)]),
                "delete annotation",
            )
            .await?;

        if affected > 0 {
            self.log_change(ChangeTable::Annotation, id, ChangeAction::Delete)
                .await?;
        }
        Ok(affected > 0)
    }
}

#[async_trait]
impl NodeStore for Session {
    async fn get_statute(&self, id: i64) -> Result<Option<Statute>, DatabaseError> {
        Session::get_statute(self, id).await
    }

    async fn get_node(&self, id: i64) -> Result<Option<Node>, DatabaseError> {
        self.query_one(
            &format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS),
            Params::Positional(vec![Value::Integer(id)]),
            "get node",
            row_to_node,
        )
        .await
    }

    async fn children(&self, scope: &SiblingScope) -> Result<Vec<Node>, DatabaseError> {
        self.query_all(
            &format!(
                "SELECT {} FROM nodes WHERE {} ORDER BY order_no ASC",
                NODE_COLUMNS, SCOPE_FILTER
            ),
            Params::Positional(scope_values(scope)),
            "fetch sibling group",
            row_to_node,
        )
        .await
    }

    async fn next_order_no(&self, scope: &SiblingScope) -> Result<i64, DatabaseError> {
        let mut values = scope_values(scope);
        values.push(Value::Integer(PLACEHOLDER_OFFSET));

        let next = self
            .query_one(
                &format!(
                    "SELECT COALESCE(MAX(order_no), 0) + 1 FROM nodes WHERE {} AND order_no < ?",
                    SCOPE_FILTER
                ),
                Params::Positional(values),
                "compute next order number",
                |row| {
                    row.get::<i64>(0)
                        .map_err(|e| DatabaseError::row_conversion(e.to_string()))
                },
            )
            .await?;
        Ok(next.unwrap_or(1))
    }

    async fn insert_node(&self, node: &NewNode, order_no: i64) -> Result<Node, DatabaseError> {
        let created = self
            .query_one(
                &format!(
                    "INSERT INTO nodes (statute_id, kind, parent_id, order_no, label_no, name, content)
                     VALUES (?, ?, ?, ?, ?, ?, ?)
                     RETURNING {}",
                    NODE_COLUMNS
                ),
                Params::Positional(vec![
                    Value::Integer(node.statute_id),
                    Value::Text(node.kind.as_str().to_string()),
                    integer(node.parent.node_id()),
                    Value::Integer(order_no),
                    text(node.label_no.as_deref()),
                    text(node.name.as_deref()),
                    text(node.content.as_deref()),
                ]),
                "insert node",
                row_to_node,
            )
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Node insert returned no row"))?;

        self.log_change(ChangeTable::Node, created.id, ChangeAction::Insert)
            .await?;
        Ok(created)
    }

    async fn update_node(&self, id: i64, update: &NodeUpdate) -> Result<bool, DatabaseError> {
        let mut sets = Vec::new();
        let mut values = Vec::new();

        if let Some(label_no) = &update.label_no {
            sets.push("label_no = ?");
            values.push(text(label_no.as_deref()));
        }
        if let Some(name) = &update.name {
            sets.push("name = ?");
            values.push(Value::Text(name.clone()));
        }
        if let Some(content) = &update.content {
            sets.push("content = ?");
            values.push(Value::Text(content.clone()));
        }
        if sets.is_empty() {
            return Ok(self.get_node(id).await?.is_some());
        }

        values.push(Value::Integer(id));
        let sql = format!(
            "UPDATE nodes SET {}, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
            sets.join(", ")
        );
        let affected = self
            .execute(&sql, Params::Positional(values), "update node")
            .await?;

        if affected > 0 {
            self.log_change(ChangeTable::Node, id, ChangeAction::Update)
                .await?;
        }
        Ok(affected > 0)
    }

    async fn delete_node(&self, id: i64) -> Result<bool, DatabaseError> {
        let affected = self
            .execute(
                "DELETE FROM nodes WHERE id = ?",
                Params::Positional(vec![Value::Integer(id)]),
                "delete node",
            )
            .await?;

        if affected > 0 {
            self.log_change(ChangeTable::Node, id, ChangeAction::Delete)
                .await?;
        }
        Ok(affected > 0)
    }

    async fn park_node(&self, id: i64) -> Result<(), DatabaseError> {
        self.execute(
            "UPDATE nodes SET order_no = ? + id WHERE id = ?",
            Params::Positional(vec![Value::Integer(PLACEHOLDER_OFFSET), Value::Integer(id)]),
            "park node at placeholder position",
        )
        .await?;
        Ok(())
    }

    async fn set_order(&self, id: i64, order_no: i64) -> Result<(), DatabaseError> {
        self.execute(
            "UPDATE nodes SET order_no = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
            Params::Positional(vec![Value::Integer(order_no), Value::Integer(id)]),
            "assign order number",
        )
        .await?;
        self.log_change(ChangeTable::Node, id, ChangeAction::Update)
            .await
    }

    async fn move_to(
        &self,
        id: i64,
        parent: ParentRef,
        order_no: i64,
    ) -> Result<(), DatabaseError> {
        self.execute(
            "UPDATE nodes SET parent_id = ?, order_no = ?, modified_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            Params::Positional(vec![
                integer(parent.node_id()),
                Value::Integer(order_no),
                Value::Integer(id),
            ]),
            "move node",
        )
        .await?;
        self.log_change(ChangeTable::Node, id, ChangeAction::Update)
            .await
    }

    async fn shift_siblings(
        &self,
        scope: &SiblingScope,
        from_order: i64,
        delta: i64,
    ) -> Result<u64, DatabaseError> {
        let mut values = vec![Value::Integer(delta)];
        values.extend(scope_values(scope));
        values.push(Value::Integer(from_order));
        values.push(Value::Integer(PLACEHOLDER_OFFSET));

        let shifted = self
            .execute(
                &format!(
                    "UPDATE nodes SET order_no = -(order_no + ?)
                     WHERE {} AND order_no >= ? AND order_no < ?",
                    SCOPE_FILTER
                ),
                Params::Positional(values),
                "shift sibling order numbers",
            )
            .await?;

        if shifted > 0 {
            let ids = self
                .query_all(
                    &format!(
                        "UPDATE nodes SET order_no = -order_no, modified_at = CURRENT_TIMESTAMP
                         WHERE {} AND order_no < 0 RETURNING id",
                        SCOPE_FILTER
                    ),
                    Params::Positional(scope_values(scope)),
                    "restore shifted order numbers",
                    |row| Ok(row.get::<i64>(0)?),
                )
                .await?;
            for id in ids {
                self.log_change(ChangeTable::Node, id, ChangeAction::Update)
                    .await?;
            }
        }

        Ok(shifted)
    }
}
