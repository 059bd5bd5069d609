// Column (blog) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::http_client::FormPart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ColumnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnStatus::Draft => "DRAFT",
            ColumnStatus::Published => "PUBLISHED",
            ColumnStatus::Archived => "ARCHIVED",
        }
    }
}

impl FromStr for ColumnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(ColumnStatus::Draft),
            "PUBLISHED" => Ok(ColumnStatus::Published),
            "ARCHIVED" => Ok(ColumnStatus::Archived),
            other => Err(format!("unknown column status: {}", other)),
        }
    }
}

/// Link to the previous/next column on a detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNavigation {
    pub id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: ColumnStatus,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub prev_column: Option<ColumnNavigation>,
    #[serde(default)]
    pub next_column: Option<ColumnNavigation>,
}

/// Fields for a new column (the thumbnail is sent alongside)
#[derive(Debug, Clone)]
pub struct ColumnDraft {
    pub title: String,
    pub content: String,
    pub status: ColumnStatus,
    pub category: String,
}

impl ColumnDraft {
    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        vec![
            FormPart::text("title", self.title),
            FormPart::text("content", self.content),
            FormPart::text("status", self.status.as_str()),
            FormPart::text("category", self.category),
        ]
    }
}

/// Partial update; only set fields are sent
#[derive(Debug, Clone, Default)]
pub struct ColumnPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ColumnStatus>,
    pub category: Option<String>,
}

impl ColumnPatch {
    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        if let Some(title) = self.title {
            parts.push(FormPart::text("title", title));
        }
        if let Some(content) = self.content {
            parts.push(FormPart::text("content", content));
        }
        if let Some(status) = self.status {
            parts.push(FormPart::text("status", status.as_str()));
        }
        if let Some(category) = self.category {
            parts.push(FormPart::text("category", category));
        }
        parts
    }
}
