//! Workflow task adapters
//!
//! Each task is an immutable configuration value with a single entry point,
//! [`RunnableTask::run`]. An invocation is one linear pipeline: render the
//! templated fields, build the wire request, call the API, map the response
//! into the task's output, and (for image tasks) materialize artifacts.
//! The first failure aborts the pipeline; no partial output is returned.

mod artifact;
pub mod chat_completion;
pub mod create_image;
pub mod translate;

pub use chat_completion::ChatCompletion;
pub use create_image::CreateImage;
pub use translate::Translate;

use crate::context::RunContext;
use crate::error::{TaskError, TaskResult};
use crate::openai::OpenAiClient;
use crate::secrets::SecretString;
use async_trait::async_trait;

/// Environment variable consulted when a task carries no API key
const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// A single orchestrator-invoked unit of work with a typed output
#[async_trait]
pub trait RunnableTask {
    /// Structured output returned to the host
    type Output;

    /// Execute the task against the host-supplied run context
    async fn run(&self, ctx: &dyn RunContext) -> TaskResult<Self::Output>;
}

/// Resolve the API key from the task configuration or the environment
pub(crate) fn resolve_api_key(
    ctx: &dyn RunContext,
    api_key: Option<&String>,
) -> TaskResult<SecretString> {
    if let Some(key) = api_key {
        return Ok(SecretString::new(ctx.render(key)?));
    }

    std::env::var(API_KEY_ENV_VAR)
        .map(SecretString::new)
        .map_err(|_| {
            TaskError::Configuration(format!(
                "`api_key` is not set and {} is not defined",
                API_KEY_ENV_VAR
            ))
        })
}

/// Build a client for one invocation, honoring an endpoint override
pub(crate) fn build_client(
    api_key: SecretString,
    base_url: Option<&String>,
) -> TaskResult<OpenAiClient> {
    let client = OpenAiClient::new(api_key)?;
    Ok(match base_url {
        Some(url) => client.with_base_url(url.clone()),
        None => client,
    })
}
