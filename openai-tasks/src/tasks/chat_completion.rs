//! Chat completion task
//!
//! Given a list of messages comprising a conversation, the model returns a
//! response. If a `prompt` is set it is appended to the rendered messages as
//! a final `user` message; at least one of `messages` or `prompt` must be
//! supplied.

use super::{build_client, resolve_api_key, RunnableTask};
use crate::context::{render_opt, Counter, RunContext};
use crate::error::{TaskError, TaskResult};
use crate::openai::{ChatChoice, ChatCompletionRequest, ChatMessage, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Chat completion task configuration
///
/// All string fields may carry template placeholders; they are resolved
/// against the run context at execution time.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    /// OpenAI API key; falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,

    /// Id of the model to use
    pub model: String,

    /// Messages comprising the conversation so far
    pub messages: Option<Vec<ChatMessage>>,

    /// Prompt appended to the conversation as a final `user` message
    pub prompt: Option<String>,

    /// Sampling temperature, between 0 and 2
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter
    pub top_p: Option<f64>,

    /// How many completion choices to generate
    pub n: Option<u32>,

    /// Up to 4 sequences where generation stops
    pub stop: Option<Vec<String>>,

    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,

    /// Presence penalty, between -2.0 and 2.0
    pub presence_penalty: Option<f64>,

    /// Frequency penalty, between -2.0 and 2.0
    pub frequency_penalty: Option<f64>,

    /// Token likelihood modifiers
    pub logit_bias: Option<HashMap<String, i64>>,

    /// End-user identifier forwarded to the API
    pub user: Option<String>,

    /// Endpoint override, e.g. an API-compatible proxy
    pub base_url: Option<String>,
}

impl ChatCompletion {
    /// Create a task for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the conversation messages
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the endpoint override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Render the templated fields and map them onto the wire request
    fn build_request(&self, ctx: &dyn RunContext) -> TaskResult<ChatCompletionRequest> {
        let mut messages = Vec::new();
        if let Some(configured) = &self.messages {
            for message in configured {
                messages.push(ChatMessage {
                    role: message.role,
                    content: ctx.render(&message.content)?,
                    name: message.name.clone(),
                });
            }
        }
        if let Some(prompt) = &self.prompt {
            messages.push(ChatMessage::user(ctx.render(prompt)?));
        }

        let stop = match &self.stop {
            Some(stop) => Some(ctx.render_list(stop)?),
            None => None,
        };

        Ok(ChatCompletionRequest {
            model: ctx.render(&self.model)?,
            messages,
            temperature: self.temperature,
            top_p: self.top_p,
            n: self.n,
            stop,
            max_tokens: self.max_tokens,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
            logit_bias: self.logit_bias.clone(),
            user: render_opt(ctx, self.user.as_ref())?,
        })
    }
}

#[async_trait]
impl RunnableTask for ChatCompletion {
    type Output = Output;

    async fn run(&self, ctx: &dyn RunContext) -> TaskResult<Output> {
        if self.messages.is_none() && self.prompt.is_none() {
            return Err(TaskError::MissingInput);
        }

        let api_key = resolve_api_key(ctx, self.api_key.as_ref())?;
        let request = self.build_request(ctx)?;
        debug!(model = %request.model, messages = request.messages.len(), "running chat completion task");

        let client = build_client(api_key, self.base_url.as_ref())?;
        let response = client.create_chat_completion(&request).await?;

        if let Some(usage) = &response.usage {
            ctx.metric(Counter::of("usage.prompt_tokens", usage.prompt_tokens as u64));
            ctx.metric(Counter::of(
                "usage.completion_tokens",
                usage.completion_tokens as u64,
            ));
            ctx.metric(Counter::of("usage.total_tokens", usage.total_tokens as u64));
        }

        Ok(Output {
            id: response.id,
            object: response.object,
            created: response.created,
            model: response.model,
            choices: response.choices,
            usage: response.usage,
        })
    }
}

/// Structured output of a chat completion invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Unique id assigned to this chat completion
    pub id: String,

    /// The type of object returned, should be "chat.completion"
    pub object: String,

    /// The creation time in epoch seconds
    pub created: i64,

    /// The model used
    pub model: String,

    /// All generated completions
    pub choices: Vec<ChatChoice>,

    /// The API usage for this request
    pub usage: Option<Usage>,
}
