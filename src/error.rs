//! Terminal errors for an agent run.
//!
//! Per-round failures (unknown tool, tool failure, tool timeout) never reach
//! this module — the loop folds them into Observations so the model can
//! recover. What lands here is only what survives recovery: a parse failure
//! that repeats after the correction re-prompt, a model transport failure
//! that outlasts its retries, or an exhausted iteration budget.

use thiserror::Error;

use crate::agent::{ParseError, Scratchpad};

/// Why a run terminated without a final answer.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Model output failed to parse, and (when enabled) the single
    /// correction re-prompt failed too.
    #[error("model output did not follow the expected format: {0}")]
    Parse(ParseError),

    /// Model call failed or timed out on every retry.
    #[error("model call failed after {attempts} attempt(s): {message}")]
    ModelTransport { attempts: u32, message: String },

    /// The round budget ran out before a final answer.
    #[error("no final answer after {0} iteration(s)")]
    IterationLimitExceeded(usize),
}

/// Terminal failure of one run, carrying the full reasoning trace for
/// diagnosis.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AgentError {
    pub kind: ErrorKind,
    /// Everything the loop accumulated before failing. Nothing is dropped.
    pub trace: Scratchpad,
}

impl AgentError {
    pub(crate) fn new(kind: ErrorKind, trace: Scratchpad) -> Self {
        Self { kind, trace }
    }

    /// Best-effort degraded answer: the last Observation recorded before the
    /// run failed, if any round completed.
    pub fn last_observation(&self) -> Option<&str> {
        self.trace.last_observation()
    }
}
