//! Image generation task
//!
//! Given a prompt, creates one or more images and optionally downloads them
//! into the run context's temporary-file storage.

use super::{artifact, build_client, resolve_api_key, RunnableTask};
use crate::context::{render_opt, RunContext, StoredFile};
use crate::error::{TaskError, TaskResult};
use crate::openai::{ImageData, ImageGenerationRequest, ImageResponseFormat, ImageSize};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Image generation task configuration
#[derive(Debug, Clone)]
pub struct CreateImage {
    /// OpenAI API key; falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,

    /// Message to send to the API as prompt
    pub prompt: String,

    /// Number of images to generate, between 1 and 10
    pub n: Option<u32>,

    /// Size of the generated images
    pub size: ImageSize,

    /// Format in which the generated images are returned
    pub response_format: ImageResponseFormat,

    /// Whether to automatically download the generated images
    pub download: bool,

    /// End-user identifier forwarded to the API
    pub user: Option<String>,

    /// Endpoint override, e.g. an API-compatible proxy
    pub base_url: Option<String>,
}

impl CreateImage {
    /// Create a task for the given prompt with default size, format and
    /// download behavior
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            api_key: None,
            prompt: prompt.into(),
            n: None,
            size: ImageSize::default(),
            response_format: ImageResponseFormat::default(),
            download: true,
            user: None,
            base_url: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the number of images to generate
    pub fn with_n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Set the image size
    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Set the response format
    pub fn with_response_format(mut self, response_format: ImageResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }

    /// Enable or disable automatic download
    pub fn with_download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    /// Set the endpoint override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Render the templated fields and map them onto the wire request
    fn build_request(&self, ctx: &dyn RunContext) -> TaskResult<ImageGenerationRequest> {
        if let Some(n) = self.n {
            if !(1..=10).contains(&n) {
                return Err(TaskError::Configuration(format!(
                    "`n` must be between 1 and 10, got {}",
                    n
                )));
            }
        }

        Ok(ImageGenerationRequest {
            prompt: ctx.render(&self.prompt)?,
            n: self.n,
            size: self.size,
            response_format: self.response_format,
            user: render_opt(ctx, self.user.as_ref())?,
        })
    }
}

#[async_trait]
impl RunnableTask for CreateImage {
    type Output = Output;

    async fn run(&self, ctx: &dyn RunContext) -> TaskResult<Output> {
        let api_key = resolve_api_key(ctx, self.api_key.as_ref())?;
        let request = self.build_request(ctx)?;
        debug!(
            size = request.size.as_str(),
            format = request.response_format.as_str(),
            "running image generation task"
        );

        let client = build_client(api_key, self.base_url.as_ref())?;
        let response = client.create_image(&request).await?;

        let files = if self.download {
            Some(
                artifact::materialize(ctx, client.http(), self.response_format, &response.data)
                    .await?,
            )
        } else {
            None
        };

        Ok(Output {
            created: response.created,
            data: response.data,
            files,
        })
    }
}

/// Structured output of an image generation invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// The creation time in epoch seconds
    pub created: i64,

    /// Metadata of the generated images
    pub data: Vec<ImageData>,

    /// Downloaded images, present only when `download` is enabled
    pub files: Option<Vec<StoredFile>>,
}
