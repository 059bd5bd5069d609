use std::fmt::Display;

use super::PORTFOLIOS_ENDPOINT;
use crate::client::ApiClient;
use crate::error::Result;
use crate::http_client::ApiRequest;
use crate::models::{Page, Portfolio, PortfolioDraft, PortfolioPatch, Upload};

/// Portfolio endpoints
pub struct PortfolioApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PortfolioApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: u32, per_page: u32) -> Result<Page<Portfolio>> {
        let request = ApiRequest::get(PORTFOLIOS_ENDPOINT)
            .with_query("page", page)
            .with_query("per_page", per_page);
        self.client.send_json(request).await
    }

    pub async fn get(&self, id: impl Display) -> Result<Portfolio> {
        self.client
            .get_json(&format!("{}/{}", PORTFOLIOS_ENDPOINT, id))
            .await
    }

    /// Create an entry with its image
    pub async fn create(&self, draft: PortfolioDraft, image: Upload) -> Result<Portfolio> {
        let mut parts = draft.into_parts();
        parts.push(image.into_part("image"));

        let request = ApiRequest::post(PORTFOLIOS_ENDPOINT).with_multipart(parts);
        let portfolio: Portfolio = self.client.send_json(request).await?;
        tracing::info!(id = %portfolio.id, "Portfolio created");
        Ok(portfolio)
    }

    /// Update the fields set in `patch`, optionally replacing the image
    pub async fn update(
        &self,
        id: impl Display,
        patch: PortfolioPatch,
        image: Option<Upload>,
    ) -> Result<Portfolio> {
        let mut parts = patch.into_parts();
        if let Some(image) = image {
            parts.push(image.into_part("image"));
        }

        let request =
            ApiRequest::put(format!("{}/{}", PORTFOLIOS_ENDPOINT, id)).with_multipart(parts);
        self.client.send_json(request).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        let request = ApiRequest::delete(format!("{}/{}", PORTFOLIOS_ENDPOINT, id));
        self.client.send(request).await?;
        tracing::info!(id = %id, "Portfolio deleted");
        Ok(())
    }
}
