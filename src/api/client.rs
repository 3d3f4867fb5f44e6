//! Reqwest-backed [`ModelClient`] for the `/responses` endpoint.

use super::{responses, ModelClient, ResponseEventStream};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{ResponseRequest, TextRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for the OpenAI Responses API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    project_id: Option<String>,
}

impl ApiClient {
    /// Build a client from resolved API configuration.
    pub fn new(config: &ApiConfig, timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            project_id: config
                .project_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }

    async fn post_responses(&self, payload: &Value) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/responses", self.base_url);
        let mut req = self.http.post(&url).bearer_auth(&self.api_key).json(payload);
        if let Some(project) = &self.project_id {
            req = req.header("OpenAI-Project", project);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { code, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelClient for ApiClient {
    async fn stream_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<ResponseEventStream, ApiError> {
        debug!(
            model = %request.model,
            items = request.input.len(),
            chained = request.previous_response_id.is_some(),
            "opening response stream"
        );
        let payload = responses::build_stream_payload(request);
        let response = self.post_responses(&payload).await?;
        Ok(responses::event_stream(response))
    }

    async fn create_response(&self, request: &TextRequest) -> Result<String, ApiError> {
        debug!(model = %request.model, "creating response");
        let payload = responses::build_text_payload(request);
        let response = self.post_responses(&payload).await?;
        let body = response.json::<Value>().await?;
        Ok(responses::extract_output_text(&body))
    }
}
