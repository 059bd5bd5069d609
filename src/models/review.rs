// Customer review models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::ClientError;
use crate::http_client::FormPart;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub name: String,
    pub rating: u8,
    pub content: String,
    pub order_type: String,
    /// Free-form amount as entered in the admin console
    pub order_amount: String,
    pub working_days: u32,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: u64,
    pub average_rating: f64,
    /// Count per star rating (1..=5)
    #[serde(default)]
    pub rating_distribution: BTreeMap<u8, u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSortBy {
    #[default]
    CreatedAt,
    Rating,
    WorkingDays,
    OrderAmount,
}

impl ReviewSortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSortBy::CreatedAt => "created_at",
            ReviewSortBy::Rating => "rating",
            ReviewSortBy::WorkingDays => "working_days",
            ReviewSortBy::OrderAmount => "order_amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filters and ordering for the review list
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewQuery {
    pub page: u32,
    pub per_page: u32,
    pub is_visible: Option<bool>,
    pub sort_by: ReviewSortBy,
    pub sort_order: SortOrder,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 12,
            is_visible: None,
            sort_by: ReviewSortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ReviewQuery {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("sort_by".to_string(), self.sort_by.as_str().to_string()),
            ("sort_order".to_string(), self.sort_order.as_str().to_string()),
        ];
        if let Some(visible) = self.is_visible {
            query.push(("is_visible".to_string(), visible.to_string()));
        }
        query
    }
}

/// Fields for a new review (images are sent alongside)
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub name: String,
    pub rating: u8,
    pub content: String,
    pub order_type: String,
    pub order_amount: String,
    pub working_days: u32,
    pub is_visible: bool,
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<(), ClientError> {
        validate_rating(self.rating)?;
        validate_working_days(self.working_days)
    }

    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        vec![
            FormPart::text("name", self.name),
            FormPart::text("rating", self.rating.to_string()),
            FormPart::text("content", self.content),
            FormPart::text("order_type", self.order_type),
            FormPart::text("order_amount", self.order_amount),
            FormPart::text("working_days", self.working_days.to_string()),
            FormPart::text("is_visible", self.is_visible.to_string()),
        ]
    }
}

/// Partial update; only set fields are sent
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub name: Option<String>,
    pub rating: Option<u8>,
    pub content: Option<String>,
    pub order_type: Option<String>,
    pub order_amount: Option<String>,
    pub working_days: Option<u32>,
    pub is_visible: Option<bool>,
}

impl ReviewPatch {
    pub fn validate(&self) -> Result<(), ClientError> {
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        if let Some(days) = self.working_days {
            validate_working_days(days)?;
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        if let Some(name) = self.name {
            parts.push(FormPart::text("name", name));
        }
        if let Some(rating) = self.rating {
            parts.push(FormPart::text("rating", rating.to_string()));
        }
        if let Some(content) = self.content {
            parts.push(FormPart::text("content", content));
        }
        if let Some(order_type) = self.order_type {
            parts.push(FormPart::text("order_type", order_type));
        }
        if let Some(amount) = self.order_amount {
            parts.push(FormPart::text("order_amount", amount));
        }
        if let Some(days) = self.working_days {
            parts.push(FormPart::text("working_days", days.to_string()));
        }
        if let Some(visible) = self.is_visible {
            parts.push(FormPart::text("is_visible", visible.to_string()));
        }
        parts
    }
}

fn validate_rating(rating: u8) -> Result<(), ClientError> {
    if !(1..=5).contains(&rating) {
        return Err(ClientError::Validation(format!(
            "rating must be between 1 and 5, got {}",
            rating
        )));
    }
    Ok(())
}

fn validate_working_days(days: u32) -> Result<(), ClientError> {
    if days == 0 {
        return Err(ClientError::Validation(
            "working_days must be at least 1".to_string(),
        ));
    }
    Ok(())
}
