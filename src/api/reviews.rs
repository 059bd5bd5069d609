use std::fmt::Display;

use super::REVIEWS_ENDPOINT;
use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::http_client::{ApiRequest, FormPart};
use crate::models::{Page, Review, ReviewDraft, ReviewPatch, ReviewQuery, ReviewStats, Upload};

/// Customer review endpoints
pub struct ReviewApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ReviewApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ReviewQuery) -> Result<Page<Review>> {
        let mut request = ApiRequest::get(REVIEWS_ENDPOINT);
        for (key, value) in query.to_query() {
            request = request.with_query(key, value);
        }
        self.client.send_json(request).await
    }

    pub async fn get(&self, id: impl Display) -> Result<Review> {
        self.client
            .get_json(&format!("{}/{}", REVIEWS_ENDPOINT, id))
            .await
    }

    pub async fn stats(&self) -> Result<ReviewStats> {
        self.client
            .get_json(&format!("{}/stats", REVIEWS_ENDPOINT))
            .await
    }

    /// Validated before anything is sent; at least one image is required
    pub async fn create(&self, draft: ReviewDraft, images: Vec<Upload>) -> Result<Review> {
        draft.validate()?;
        if images.is_empty() {
            return Err(ClientError::Validation(
                "a review needs at least one image".to_string(),
            ));
        }

        let parts = with_images(draft.into_parts(), images);
        let request = ApiRequest::post(REVIEWS_ENDPOINT).with_multipart(parts);
        let review: Review = self.client.send_json(request).await?;
        tracing::info!(id = %review.id, rating = review.rating, "Review created");
        Ok(review)
    }

    pub async fn update(
        &self,
        id: impl Display,
        patch: ReviewPatch,
        images: Vec<Upload>,
    ) -> Result<Review> {
        patch.validate()?;

        let parts = with_images(patch.into_parts(), images);
        let request = ApiRequest::put(format!("{}/{}", REVIEWS_ENDPOINT, id)).with_multipart(parts);
        self.client.send_json(request).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        let request = ApiRequest::delete(format!("{}/{}", REVIEWS_ENDPOINT, id));
        self.client.send(request).await?;
        tracing::info!(id = %id, "Review deleted");
        Ok(())
    }
}

fn with_images(mut parts: Vec<FormPart>, images: Vec<Upload>) -> Vec<FormPart> {
    parts.extend(images.into_iter().map(|image| image.into_part("images")));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialKeys, MemoryCredentialStore};
    use crate::http_client::RequestBody;
    use crate::testing::{json_response, RecordingRedirect, RecordingTransport};
    use serde_json::json;
    use std::sync::Arc;

    fn review_json() -> serde_json::Value {
        json!({
            "id": "7b7f2d6e-2c55-4f43-a7a4-0d3d4c0a9b11",
            "name": "Kim",
            "rating": 5,
            "content": "Fast and friendly",
            "order_type": "logo",
            "order_amount": "300000",
            "working_days": 7,
            "images": ["/uploads/reviews/1.png"],
            "is_visible": true,
            "created_at": "2024-06-01T00:00:00Z",
            "updated_at": "2024-06-01T00:00:00Z"
        })
    }

    fn draft(rating: u8) -> ReviewDraft {
        ReviewDraft {
            name: "Kim".to_string(),
            rating,
            content: "Fast and friendly".to_string(),
            order_type: "logo".to_string(),
            order_amount: "300000".to_string(),
            working_days: 7,
            is_visible: true,
        }
    }

    fn client(transport: Arc<RecordingTransport>) -> ApiClient {
        ApiClient::builder()
            .transport(transport)
            .store(Arc::new(MemoryCredentialStore::with_tokens(
                CredentialKeys::default(),
                "a1",
                "r1",
            )))
            .redirect(RecordingRedirect::new())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_rating_is_not_sent() {
        let transport = Arc::new(RecordingTransport::new(|_| {
            Ok(json_response(201, review_json()))
        }));

        let err = client(transport.clone())
            .reviews()
            .create(draft(6), vec![Upload::new("1.png", "image/png", vec![1])])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_create_attaches_every_image() {
        let transport = Arc::new(RecordingTransport::new(|_| {
            Ok(json_response(201, review_json()))
        }));
        let images = vec![
            Upload::new("1.png", "image/png", vec![1]),
            Upload::new("2.png", "image/png", vec![2]),
        ];

        let review = client(transport.clone())
            .reviews()
            .create(draft(5), images)
            .await
            .unwrap();
        assert_eq!(review.images.len(), 1);

        let sent = transport.sent();
        let RequestBody::Multipart(parts) = sent[0].body() else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.iter().filter(|p| p.name == "images").count(), 2);
    }

    #[tokio::test]
    async fn test_stats_path() {
        let transport = Arc::new(RecordingTransport::new(|_| {
            Ok(json_response(
                200,
                json!({"total_reviews": 2, "average_rating": 4.5, "rating_distribution": {"4": 1, "5": 1}}),
            ))
        }));

        let stats = client(transport.clone()).reviews().stats().await.unwrap();
        assert_eq!(stats.total_reviews, 2);
        assert_eq!(transport.sent()[0].path(), "/api/v1/reviews/stats");
    }

    #[tokio::test]
    async fn test_list_forwards_query() {
        let transport = Arc::new(RecordingTransport::new(|_| {
            Ok(json_response(200, json!({"items": [review_json()], "total": 1})))
        }));
        let query = ReviewQuery {
            is_visible: Some(true),
            ..Default::default()
        };

        let page = client(transport.clone()).reviews().list(&query).await.unwrap();
        assert_eq!(page.items[0].rating, 5);
        assert!(transport.sent()[0]
            .query()
            .contains(&("is_visible".to_string(), "true".to_string())));
    }

    #[tokio::test]
    async fn test_create_without_images_is_not_sent() {
        let transport = Arc::new(RecordingTransport::new(|_| {
            Ok(json_response(201, review_json()))
        }));

        let err = client(transport.clone())
            .reviews()
            .create(draft(5), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.sent().is_empty());
    }
}
