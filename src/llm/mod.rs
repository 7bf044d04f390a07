//! Model transport abstraction.
//!
//! The agent loop only needs one operation from a model: turn a prompt into
//! raw text. `OpenAiCompatClient` speaks that over an OpenAI-compatible HTTP
//! API; `ScriptedModel` replays canned replies for tests and offline demos.

mod openai;
mod scripted;

pub use openai::OpenAiCompatClient;
pub use scripted::ScriptedModel;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the model transport. Retried by the agent loop up to its
/// configured bound before becoming terminal.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("model returned an empty response")]
    Empty,
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        ModelError::Transport(err.to_string())
    }
}

/// A completion-capable language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a raw text completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}
