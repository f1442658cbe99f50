//! Translation task
//!
//! Translates text by prompting the chat completion endpoint. The model and
//! choice count are fixed (`gpt-3.5-turbo`, `n = 1`); only the languages and
//! the text are configurable.

use super::{build_client, resolve_api_key, RunnableTask};
use crate::context::RunContext;
use crate::error::TaskResult;
use crate::openai::{ApiError, ChatCompletionRequest, ChatMessage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Model used for every translation request
const TRANSLATE_MODEL: &str = "gpt-3.5-turbo";

/// Translation task configuration
#[derive(Debug, Clone, Default)]
pub struct Translate {
    /// OpenAI API key; falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,

    /// Language to translate from, when known
    pub from: Option<String>,

    /// Language to translate to
    pub to: String,

    /// Text to translate
    pub text: String,

    /// Endpoint override, e.g. an API-compatible proxy
    pub base_url: Option<String>,
}

impl Translate {
    /// Create a task translating `text` into `to`
    pub fn new(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the source language
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the endpoint override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Build the fixed-model chat request carrying the translation prompt
fn build_request(from: Option<&str>, to: &str, text: &str) -> ChatCompletionRequest {
    // Include the source language when we know it
    let content = match from {
        Some(from) => format!("Translate '{}' from {} in {}", text, from, to),
        None => format!("Translate '{}' in {}", text, to),
    };

    ChatCompletionRequest {
        model: TRANSLATE_MODEL.to_string(),
        messages: vec![ChatMessage::user(content)],
        n: Some(1),
        ..ChatCompletionRequest::default()
    }
}

#[async_trait]
impl RunnableTask for Translate {
    type Output = Output;

    async fn run(&self, ctx: &dyn RunContext) -> TaskResult<Output> {
        let api_key = resolve_api_key(ctx, self.api_key.as_ref())?;
        let to = ctx.render(&self.to)?;
        let text = ctx.render(&self.text)?;
        let from = match &self.from {
            Some(from) => Some(ctx.render(from)?),
            None => None,
        };
        debug!(to = %to, "running translation task");

        let request = build_request(from.as_deref(), &to, &text);
        let client = build_client(api_key, self.base_url.as_ref())?;
        let response = client.create_chat_completion(&request).await?;

        let translation = response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| ApiError::Parse("response contained no choices".to_string()))?;

        Ok(Output {
            to,
            text,
            translation,
        })
    }
}

/// Structured output of a translation invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Language translated to
    pub to: String,

    /// The original text, unchanged
    pub text: String,

    /// The translated text
    pub translation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::ChatRole;

    #[test]
    fn prompt_without_source_language() {
        let request = build_request(None, "english", "Ceci est un tutoriel");
        assert_eq!(request.model, TRANSLATE_MODEL);
        assert_eq!(request.n, Some(1));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(
            request.messages[0].content,
            "Translate 'Ceci est un tutoriel' in english"
        );
    }

    #[test]
    fn prompt_with_source_language() {
        let request = build_request(Some("french"), "english", "Bonjour");
        assert_eq!(
            request.messages[0].content,
            "Translate 'Bonjour' from french in english"
        );
    }
}
