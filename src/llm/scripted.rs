//! Deterministic scripted model for tests and offline demos.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LanguageModel, ModelError};

/// Replays a fixed sequence of replies, one per `complete` call, and records
/// every prompt it sees so tests can assert on what the loop rendered.
pub struct ScriptedModel {
    replies: Vec<String>,
    cursor: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_message: Option<String>,
}

impl ScriptedModel {
    /// Replies are consumed in order; a call past the end of the script is a
    /// transport error.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_message: None,
        }
    }

    /// A model whose every call fails with `message` (transport-retry tests).
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            replies: Vec::new(),
            cursor: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_message: Some(message.into()),
        }
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let n = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(message) = &self.fail_message {
            return Err(ModelError::Transport(message.clone()));
        }

        self.replies
            .get(n)
            .cloned()
            .ok_or_else(|| ModelError::Transport(format!("script exhausted after {} replies", n)))
    }
}
