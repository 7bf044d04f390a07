//! Tool registry and built-in tools.
//!
//! A tool is a named capability the model can invoke with a single string
//! argument. The name identifies it in the registry, the description is only
//! ever rendered into the model-facing prompt, and `invoke` does the work.
//! The registry is built once, handed to the agent, and never mutated again.

mod calc;
mod clock;
mod lookup;

pub use calc::Calculator;
pub use clock::CurrentTime;
pub use lookup::StaticLookup;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// A capability the model can direct the agent to execute.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// What this tool does and when to use it. Rendered into the prompt,
    /// never parsed by the agent.
    fn description(&self) -> &str;

    /// Execute the tool with a single string argument.
    async fn invoke(&self, input: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),

    #[error("tool name must not be empty")]
    EmptyName,
}

/// Errors raised while dispatching a single tool invocation.
///
/// None of these are fatal to a run: the agent loop renders them into an
/// Observation so the model can change course.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{name}' (available: {available})")]
    Unknown { name: String, available: String },

    #[error("tool '{name}' failed: {message}")]
    Execution { name: String, message: String },

    #[error("tool '{name}' timed out after {seconds}s")]
    Timeout { name: String, seconds: u64 },
}

/// Immutable collection of tools, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique and non-empty; descriptions are
    /// free-form and deliberately not validated.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// All tools, sorted by name so rendered prompts are deterministic.
    pub fn list_tools(&self) -> Vec<&Arc<dyn Tool>> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by_key(|t| t.name());
        tools
    }

    /// Comma-separated tool names, sorted.
    pub fn names(&self) -> String {
        let mut names: Vec<_> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
