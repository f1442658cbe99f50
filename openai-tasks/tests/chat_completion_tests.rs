//! End-to-end tests for the chat completion task against a stubbed API

use openai_tasks::context::{Counter, InMemoryRunContext};
use openai_tasks::openai::{ApiError, ChatMessage};
use openai_tasks::tasks::{ChatCompletion, RunnableTask};
use openai_tasks::TaskError;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_response_body() -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1_694_268_190,
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "The capital of France is Paris."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 9, "completion_tokens": 8, "total_tokens": 17}
    })
}

#[tokio::test]
async fn run_with_prompt_returns_choices_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [{"role": "user", "content": "what is the capital of France?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = InMemoryRunContext::new(std::env::temp_dir());
    let task = ChatCompletion::new("gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_prompt("what is the capital of France?")
        .with_base_url(format!("{}/v1", server.uri()));

    let output = task.run(&ctx).await.unwrap();

    assert_eq!(output.id, "chatcmpl-123");
    assert_eq!(output.object, "chat.completion");
    assert!(!output.choices.is_empty());
    assert_eq!(
        output.choices[0].message.content,
        "The capital of France is Paris."
    );
    let usage = output.usage.unwrap();
    assert!(usage.total_tokens > 0);
}

#[tokio::test]
async fn usage_counters_are_reported_to_the_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response_body()))
        .mount(&server)
        .await;

    let ctx = InMemoryRunContext::new(std::env::temp_dir());
    let task = ChatCompletion::new("gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_prompt("count my tokens")
        .with_base_url(format!("{}/v1", server.uri()));

    task.run(&ctx).await.unwrap();

    let metrics = ctx.metrics();
    assert_eq!(
        metrics,
        vec![
            Counter::of("usage.prompt_tokens", 9),
            Counter::of("usage.completion_tokens", 8),
            Counter::of("usage.total_tokens", 17),
        ]
    );
}

#[tokio::test]
async fn templated_fields_are_rendered_before_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "Answer about Germany only."},
                {"role": "user", "content": "what is the capital of Germany?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = InMemoryRunContext::new(std::env::temp_dir()).with_variable("country", "Germany");
    let task = ChatCompletion::new("gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_messages(vec![ChatMessage::system("Answer about {{ country }} only.")])
        .with_prompt("what is the capital of {{ country }}?")
        .with_base_url(format!("{}/v1", server.uri()));

    task.run(&ctx).await.unwrap();
}

#[tokio::test]
async fn undefined_variable_aborts_without_calling_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response_body()))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = InMemoryRunContext::new(std::env::temp_dir());
    let task = ChatCompletion::new("gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_prompt("hello {{ nobody }}")
        .with_base_url(format!("{}/v1", server.uri()));

    let err = task.run(&ctx).await.unwrap_err();
    assert!(matches!(err, TaskError::Template(_)));
}

#[tokio::test]
async fn authentication_failures_surface_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let ctx = InMemoryRunContext::new(std::env::temp_dir());
    let task = ChatCompletion::new("gpt-3.5-turbo")
        .with_api_key("sk-bad")
        .with_prompt("hello")
        .with_base_url(format!("{}/v1", server.uri()));

    let err = task.run(&ctx).await.unwrap_err();
    match err {
        TaskError::Api(ApiError::Authentication(message)) => {
            assert_eq!(message, "Incorrect API key provided")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
