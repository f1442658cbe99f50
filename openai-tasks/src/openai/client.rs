//! OpenAI HTTP client

use super::error::{ApiError, ApiResult};
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ImageGenerationRequest, ImageResponse,
    OpenAiErrorEnvelope,
};
use crate::secrets::SecretString;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Request timeout applied to every call
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Stateless client for the OpenAI API, built fresh per task invocation
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiClient {
    /// Create a new client for the given API key
    pub fn new(api_key: impl Into<SecretString>) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ApiError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at a different endpoint, e.g. an API-compatible proxy
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The underlying HTTP client, shared with artifact downloads
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Call the chat completion endpoint
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> ApiResult<ChatCompletionResponse> {
        self.post_json("/chat/completions", request).await
    }

    /// Call the image generation endpoint
    pub async fn create_image(&self, request: &ImageGenerationRequest) -> ApiResult<ImageResponse> {
        self.post_json("/images/generations", request).await
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "sending OpenAI API request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, "OpenAI API request failed");
            Err(handle_error_response(status, body))
        }
    }
}

/// Map an unsuccessful HTTP response to an [`ApiError`]
fn handle_error_response(status: StatusCode, body: String) -> ApiError {
    // Try to parse the OpenAI error envelope first
    if let Ok(envelope) = serde_json::from_str::<OpenAiErrorEnvelope>(&body) {
        match envelope.error.error_type.as_str() {
            "invalid_api_key" => ApiError::Authentication(envelope.error.message),
            "rate_limit_exceeded" => ApiError::RateLimit {
                message: envelope.error.message,
                retry_after_secs: None,
            },
            "model_not_found" => ApiError::ModelNotFound(envelope.error.message),
            "insufficient_quota" => ApiError::InsufficientQuota(envelope.error.message),
            "invalid_request_error" => ApiError::InvalidRequest(envelope.error.message),
            _ => ApiError::Api {
                code: envelope.error.error_type,
                message: envelope.error.message,
            },
        }
    } else {
        // Fall back to status code-based mapping
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Authentication(body),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit {
                message: body,
                retry_after_secs: None,
            },
            StatusCode::BAD_REQUEST => ApiError::InvalidRequest(body),
            StatusCode::NOT_FOUND => ApiError::ModelNotFound(body),
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => ApiError::ServiceUnavailable(body),
            _ => ApiError::Api {
                code: status.to_string(),
                message: body,
            },
        }
    }
}
