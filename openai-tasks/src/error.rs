//! Task-level error taxonomy
//!
//! Every failure aborts the current invocation and surfaces to the host
//! unchanged; nothing is retried or recovered inside the tasks themselves.

use crate::context::RenderError;
use crate::openai::ApiError;
use thiserror::Error;

/// Result type for task invocations
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors that can abort a task invocation
#[derive(Debug, Error)]
pub enum TaskError {
    /// Invalid task configuration
    #[error("Invalid task configuration: {0}")]
    Configuration(String),

    /// Neither messages nor prompt supplied to a chat task
    #[error("At least one of `messages` or `prompt` must be set")]
    MissingInput,

    /// A template placeholder could not be resolved
    #[error(transparent)]
    Template(#[from] RenderError),

    /// The remote API call failed; propagated unchanged
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Downloading a generated image failed
    #[error("Failed to download image from '{url}': {message}")]
    Download { url: String, message: String },

    /// A base64 image payload was malformed
    #[error("Failed to decode base64 image payload: {0}")]
    Decode(String),

    /// Persisting an artifact through the run context failed
    #[error("Failed to store artifact: {0}")]
    Storage(#[from] std::io::Error),
}
