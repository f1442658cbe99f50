//! Workflow task adapters for the OpenAI API
//!
//! This crate lets a workflow orchestration engine invoke OpenAI's hosted
//! APIs as individual tasks: [`ChatCompletion`], [`CreateImage`] and
//! [`Translate`]. Each task renders its templated configuration against a
//! host-supplied [`RunContext`], calls the API over HTTP, and maps the
//! response into a structured output. Image tasks can additionally persist
//! the generated images through the run context's temporary-file storage.
//!
//! An invocation is fully synchronous from the adapter's perspective: one
//! linear pipeline per `run`, no shared state between invocations, no local
//! retries. Failures surface to the host unchanged as [`TaskError`].

pub mod context;
pub mod error;
pub mod openai;
pub mod secrets;
pub mod tasks;

pub use context::{Counter, InMemoryRunContext, RenderError, RunContext, StoredFile};
pub use error::{TaskError, TaskResult};
pub use secrets::SecretString;
pub use tasks::{ChatCompletion, CreateImage, RunnableTask, Translate};

/// Returns the version of the library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
