//! Annotation Model
//!
//! An annotation is a footnote registered against a statute. Citation markup
//! in statute text refers to it by number (`a=`) and optionally by page (`p=`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::node::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: i64,
    pub statute_id: i64,
    /// Footnote number as written in the source text
    pub no: String,
    pub page_no: Option<String>,
    pub footnote: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Annotation {
    /// Lookup key used by citation markup
    pub fn key(&self) -> String {
        annotation_key(&self.no, self.page_no.as_deref())
    }
}

/// Build the lookup key: `"{no}_{page}"` when a page is given, else `"{no}"`
pub fn annotation_key(no: &str, page: Option<&str>) -> String {
    match page {
        Some(page) if !page.is_empty() => format!("{}_{}", no, page),
        _ => no.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnotation {
    pub statute_id: i64,
    pub no: String,
    #[serde(default)]
    pub page_no: Option<String>,
    #[serde(default)]
    pub footnote: Option<String>,
}

impl NewAnnotation {
    pub fn new(statute_id: i64, no: impl Into<String>) -> Self {
        Self {
            statute_id,
            no: no.into(),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page_no: impl Into<String>) -> Self {
        self.page_no = Some(page_no.into());
        self
    }

    pub fn with_footnote(mut self, footnote: impl Into<String>) -> Self {
        self.footnote = Some(footnote.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.no.trim().is_empty() {
            return Err(ValidationError::MissingField("no".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::node::deserialize_optional_field"
    )]
    pub page_no: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::node::deserialize_optional_field"
    )]
    pub footnote: Option<Option<String>>,
}

impl AnnotationUpdate {
    pub fn is_empty(&self) -> bool {
        self.no.is_none() && self.page_no.is_none() && self.footnote.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.no.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::MissingField("no".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_key_with_and_without_page() {
        assert_eq!(annotation_key("12", None), "12");
        assert_eq!(annotation_key("12", Some("3")), "12_3");
        assert_eq!(annotation_key("12", Some("")), "12", "empty page is treated as absent");
    }

    #[test]
    fn test_new_annotation_requires_number() {
        assert!(NewAnnotation::new(1, "4").validate().is_ok());
        assert!(NewAnnotation::new(1, " ").validate().is_err());
    }
}
