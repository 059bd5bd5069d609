// Portfolio models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_client::FormPart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortfolioCategory {
    Logo,
    Branding,
    Packaging,
    Illustration,
    Other,
}

impl PortfolioCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioCategory::Logo => "LOGO",
            PortfolioCategory::Branding => "BRANDING",
            PortfolioCategory::Packaging => "PACKAGING",
            PortfolioCategory::Illustration => "ILLUSTRATION",
            PortfolioCategory::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortfolioVisibility {
    Public,
    Private,
}

impl PortfolioVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioVisibility::Public => "PUBLIC",
            PortfolioVisibility::Private => "PRIVATE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: PortfolioCategory,
    pub image_url: String,
    pub display_order: i32,
    pub visibility: PortfolioVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new portfolio entry (the image is sent alongside)
#[derive(Debug, Clone)]
pub struct PortfolioDraft {
    pub title: String,
    pub description: String,
    pub category: PortfolioCategory,
    pub visibility: PortfolioVisibility,
    pub display_order: i32,
}

impl PortfolioDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: PortfolioCategory::Logo,
            visibility: PortfolioVisibility::Public,
            display_order: 0,
        }
    }

    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        vec![
            FormPart::text("title", self.title),
            FormPart::text("description", self.description),
            FormPart::text("category", self.category.as_str()),
            FormPart::text("visibility", self.visibility.as_str()),
            FormPart::text("display_order", self.display_order.to_string()),
        ]
    }
}

/// Partial update; only set fields are sent
#[derive(Debug, Clone, Default)]
pub struct PortfolioPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<PortfolioCategory>,
    pub visibility: Option<PortfolioVisibility>,
    pub display_order: Option<i32>,
}

impl PortfolioPatch {
    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        if let Some(title) = self.title {
            parts.push(FormPart::text("title", title));
        }
        if let Some(description) = self.description {
            parts.push(FormPart::text("description", description));
        }
        if let Some(category) = self.category {
            parts.push(FormPart::text("category", category.as_str()));
        }
        if let Some(visibility) = self.visibility {
            parts.push(FormPart::text("visibility", visibility.as_str()));
        }
        if let Some(display_order) = self.display_order {
            parts.push(FormPart::text("display_order", display_order.to_string()));
        }
        parts
    }
}
