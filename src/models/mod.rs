// Wire models for the studio API

pub mod column;
pub mod portfolio;
pub mod review;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::http_client::FormPart;

pub use column::{Column, ColumnDraft, ColumnNavigation, ColumnPatch, ColumnStatus};
pub use portfolio::{Portfolio, PortfolioCategory, PortfolioDraft, PortfolioPatch, PortfolioVisibility};
pub use review::{
    Review, ReviewDraft, ReviewPatch, ReviewQuery, ReviewSortBy, ReviewStats, SortOrder,
};

/// Paginated list envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// File attached to a multipart request
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_for(&file_name);
        Ok(Self::new(file_name, mime, data))
    }

    pub(crate) fn into_part(self, field: &str) -> FormPart {
        FormPart::file(field, self.file_name, self.mime, self.data)
    }
}

/// MIME type for the image formats the admin console uploads
fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
