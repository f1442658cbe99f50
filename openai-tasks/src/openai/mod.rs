//! OpenAI API adapter
//!
//! Thin HTTP wrapper around the chat-completion and image-generation
//! endpoints. Requests are built by the task layer; this module only owns
//! transport, serialization and error mapping.

mod client;
mod error;
pub mod types;

pub use client::{OpenAiClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult};
pub use types::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, ImageData,
    ImageGenerationRequest, ImageResponse, ImageResponseFormat, ImageSize, Usage,
};
