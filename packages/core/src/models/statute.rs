//! Statute Model
//!
//! The statute is the root owner of both hierarchies and of its annotation
//! table. Deleting a statute cascades to everything it owns.

use super::node::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statute {
    pub id: i64,
    /// Unique title, e.g. "Companies Act"
    pub name: String,
    pub act_no: Option<String>,
    pub date: Option<NaiveDate>,
    /// Introductory text; may carry citation markup
    pub preface: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStatute {
    pub name: String,
    #[serde(default)]
    pub act_no: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub preface: Option<String>,
}

impl NewStatute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_act_no(mut self, act_no: impl Into<String>) -> Self {
        self.act_no = Some(act_no.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_preface(mut self, preface: impl Into<String>) -> Self {
        self.preface = Some(preface.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        Ok(())
    }
}

/// Partial statute update; nullable columns use the double-Option pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatuteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::node::deserialize_optional_field"
    )]
    pub act_no: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::node::deserialize_optional_field"
    )]
    pub date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::node::deserialize_optional_field"
    )]
    pub preface: Option<Option<String>>,
}

impl StatuteUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.act_no.is_none() && self.date.is_none() && self.preface.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        Ok(())
    }
}

/// Parse a stored `YYYY-MM-DD` date column
pub fn parse_statute_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}
