//! In-memory run context
//!
//! Resolves `{{ name }}` placeholders against a variable map, stores temp
//! files under a caller-provided directory and records metrics in memory.
//! Hosts with their own rendering engine implement [`RunContext`] directly.

use super::{Counter, RenderError, RunContext, StoredFile};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}";

/// Self-contained [`RunContext`] implementation
pub struct InMemoryRunContext {
    variables: HashMap<String, String>,
    storage_dir: PathBuf,
    metrics: Mutex<Vec<Counter>>,
    pattern: Regex,
}

impl InMemoryRunContext {
    /// Create a run context storing temp files under `storage_dir`
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            variables: HashMap::new(),
            storage_dir: storage_dir.into(),
            metrics: Mutex::new(Vec::new()),
            pattern: Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"),
        }
    }

    /// Add a template variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Add a set of template variables
    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Counters reported so far, in emission order
    pub fn metrics(&self) -> Vec<Counter> {
        self.metrics.lock().expect("metrics lock poisoned").clone()
    }
}

impl RunContext for InMemoryRunContext {
    fn render(&self, input: &str) -> Result<String, RenderError> {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;
        for captures in self.pattern.captures_iter(input) {
            let matched = captures.get(0).expect("group 0 always matches");
            let name = &captures[1];
            let value =
                self.variables
                    .get(name)
                    .ok_or_else(|| RenderError::UndefinedVariable {
                        name: name.to_string(),
                    })?;
            output.push_str(&input[last..matched.start()]);
            output.push_str(value);
            last = matched.end();
        }
        output.push_str(&input[last..]);
        Ok(output)
    }

    fn put_temp_file(&self, bytes: &[u8], name: &str) -> std::io::Result<StoredFile> {
        fs::create_dir_all(&self.storage_dir)?;
        let path = self.storage_dir.join(name);
        fs::write(&path, bytes)?;
        Ok(StoredFile {
            name: name.to_string(),
            path,
        })
    }

    fn metric(&self, counter: Counter) {
        self.metrics
            .lock()
            .expect("metrics lock poisoned")
            .push(counter);
    }
}
