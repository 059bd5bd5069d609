use std::fmt::Display;

use super::COLUMNS_ENDPOINT;
use crate::client::ApiClient;
use crate::error::Result;
use crate::http_client::ApiRequest;
use crate::models::{Column, ColumnDraft, ColumnPatch, ColumnStatus, Page, Upload};

/// Column (blog post) endpoints
pub struct ColumnApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ColumnApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        page: u32,
        per_page: u32,
        status: Option<ColumnStatus>,
    ) -> Result<Page<Column>> {
        let mut request = ApiRequest::get(COLUMNS_ENDPOINT)
            .with_query("page", page)
            .with_query("per_page", per_page);
        if let Some(status) = status {
            request = request.with_query("status", status.as_str());
        }
        self.client.send_json(request).await
    }

    pub async fn get(&self, id: impl Display) -> Result<Column> {
        self.client
            .get_json(&format!("{}/{}", COLUMNS_ENDPOINT, id))
            .await
    }

    pub async fn create(&self, draft: ColumnDraft, thumbnail: Option<Upload>) -> Result<Column> {
        let mut parts = draft.into_parts();
        if let Some(thumbnail) = thumbnail {
            parts.push(thumbnail.into_part("thumbnail"));
        }

        let request = ApiRequest::post(COLUMNS_ENDPOINT).with_multipart(parts);
        let column: Column = self.client.send_json(request).await?;
        tracing::info!(id = %column.id, "Column created");
        Ok(column)
    }

    /// Update the fields set in `patch`; a new thumbnail goes in `thumbnail_image`
    pub async fn update(
        &self,
        id: impl Display,
        patch: ColumnPatch,
        thumbnail: Option<Upload>,
    ) -> Result<Column> {
        let mut parts = patch.into_parts();
        if let Some(thumbnail) = thumbnail {
            parts.push(thumbnail.into_part("thumbnail_image"));
        }

        let request =
            ApiRequest::put(format!("{}/{}", COLUMNS_ENDPOINT, id)).with_multipart(parts);
        self.client.send_json(request).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        let request = ApiRequest::delete(format!("{}/{}", COLUMNS_ENDPOINT, id));
        self.client.send(request).await?;
        tracing::info!(id = %id, "Column deleted");
        Ok(())
    }

    pub async fn increment_view(&self, id: impl Display) -> Result<()> {
        let request = ApiRequest::post(format!("{}/{}/view", COLUMNS_ENDPOINT, id));
        self.client.send(request).await?;
        Ok(())
    }
}
