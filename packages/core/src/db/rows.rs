//! Row conversion from libsql rows to models
//!
//! Column lists here and the `row_to_*` functions must stay in the same order.

use crate::db::error::DatabaseError;
use crate::models::{parse_statute_date, Annotation, Node, NodeKind, Statute};
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;

pub(crate) const NODE_COLUMNS: &str =
    "id, statute_id, kind, parent_id, order_no, label_no, name, content, created_at, modified_at";

pub(crate) const STATUTE_COLUMNS: &str =
    "id, name, act_no, date, preface, created_at, modified_at";

pub(crate) const ANNOTATION_COLUMNS: &str =
    "id, statute_id, no, page_no, footnote, created_at, modified_at";

/// Parse SQLite `CURRENT_TIMESTAMP` output, falling back to RFC3339
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(DatabaseError::row_conversion(format!(
        "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
        s
    )))
}

fn column_error(name: &str) -> impl FnOnce(libsql::Error) -> DatabaseError + '_ {
    move |e| DatabaseError::row_conversion(format!("Failed to get {}: {}", name, e))
}

pub(crate) fn row_to_node(row: &Row) -> Result<Node, DatabaseError> {
    let kind: String = row.get(2).map_err(column_error("kind"))?;
    let kind = kind
        .parse::<NodeKind>()
        .map_err(|e| DatabaseError::row_conversion(e.to_string()))?;
    let created_at: String = row.get(8).map_err(column_error("created_at"))?;
    let modified_at: String = row.get(9).map_err(column_error("modified_at"))?;

    Ok(Node {
        id: row.get(0).map_err(column_error("id"))?,
        statute_id: row.get(1).map_err(column_error("statute_id"))?,
        kind,
        parent_id: row.get(3).map_err(column_error("parent_id"))?,
        order_no: row.get(4).map_err(column_error("order_no"))?,
        label_no: row.get(5).map_err(column_error("label_no"))?,
        name: row.get(6).map_err(column_error("name"))?,
        content: row.get(7).map_err(column_error("content"))?,
        created_at: parse_timestamp(&created_at)?,
        modified_at: parse_timestamp(&modified_at)?,
    })
}

pub(crate) fn row_to_statute(row: &Row) -> Result<Statute, DatabaseError> {
    let date: Option<String> = row.get(3).map_err(column_error("date"))?;
    let date = date
        .as_deref()
        .map(parse_statute_date)
        .transpose()
        .map_err(|e| DatabaseError::row_conversion(e.to_string()))?;
    let created_at: String = row.get(5).map_err(column_error("created_at"))?;
    let modified_at: String = row.get(6).map_err(column_error("modified_at"))?;

    Ok(Statute {
        id: row.get(0).map_err(column_error("id"))?,
        name: row.get(1).map_err(column_error("name"))?,
        act_no: row.get(2).map_err(column_error("act_no"))?,
        date,
        preface: row.get(4).map_err(column_error("preface"))?,
        created_at: parse_timestamp(&created_at)?,
        modified_at: parse_timestamp(&modified_at)?,
    })
}

pub(crate) fn row_to_annotation(row: &Row) -> Result<Annotation, DatabaseError> {
    let created_at: String = row.get(5).map_err(column_error("created_at"))?;
    let modified_at: String = row.get(6).map_err(column_error("modified_at"))?;

    Ok(Annotation {
        id: row.get(0).map_err(column_error("id"))?,
        statute_id: row.get(1).map_err(column_error("statute_id"))?,
        no: row.get(2).map_err(column_error("no"))?,
        page_no: row.get(3).map_err(column_error("page_no"))?,
        footnote: row.get(4).map_err(column_error("footnote"))?,
        created_at: parse_timestamp(&created_at)?,
        modified_at: parse_timestamp(&modified_at)?,
    })
}
