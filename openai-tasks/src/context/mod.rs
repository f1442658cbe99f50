//! Run-context collaborator surface
//!
//! A [`RunContext`] is supplied by the host orchestrator for the duration of
//! one task invocation. It owns template rendering, temporary-file storage
//! and metric collection; tasks never manage those concerns themselves.
//!
//! [`InMemoryRunContext`] is a self-contained implementation for tests and
//! simple embeddings.

mod memory;

pub use memory::InMemoryRunContext;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Template rendering failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A placeholder referenced a variable that is not defined
    #[error("Undefined variable '{name}' in template")]
    UndefinedVariable { name: String },
}

/// A named counter metric reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Metric name, e.g. `usage.total_tokens`
    pub name: String,

    /// Counter value
    pub value: u64,
}

impl Counter {
    /// Create a counter metric
    pub fn of(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Handle for a file persisted through the run context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// File name, unique within the invocation
    pub name: String,

    /// Location of the stored bytes
    pub path: PathBuf,
}

/// Services the host orchestrator provides to a running task
pub trait RunContext: Send + Sync {
    /// Resolve template placeholders in a string against run-time variables
    fn render(&self, input: &str) -> Result<String, RenderError>;

    /// Render every element of a list
    fn render_list(&self, inputs: &[String]) -> Result<Vec<String>, RenderError> {
        inputs.iter().map(|input| self.render(input)).collect()
    }

    /// Render every value of a map, keys are left untouched
    fn render_map(
        &self,
        inputs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, RenderError> {
        inputs
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.render(value)?)))
            .collect()
    }

    /// Persist bytes under the given name in the invocation's temp storage
    fn put_temp_file(&self, bytes: &[u8], name: &str) -> std::io::Result<StoredFile>;

    /// Report a counter metric to the host
    fn metric(&self, counter: Counter);
}

/// Render an optional templated field
pub(crate) fn render_opt(
    ctx: &dyn RunContext,
    value: Option<&String>,
) -> Result<Option<String>, RenderError> {
    value.map(|v| ctx.render(v)).transpose()
}
