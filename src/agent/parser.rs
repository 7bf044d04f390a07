//! Parser for the fixed textual protocol between the loop and the model.
//!
//! The grammar is deliberately rigid: case-sensitive keywords, one per line.
//! A reply is either one tool call (`Thought:` then `Action:` plus
//! `Action Input:`) or a final answer (`Thought:` then `Final Answer:`).
//! Anything the model writes after an `Observation:` line is discarded —
//! observations are inserted by the loop, never accepted from the model.

use thiserror::Error;

pub(crate) const THOUGHT: &str = "Thought:";
pub(crate) const ACTION: &str = "Action:";
pub(crate) const ACTION_INPUT: &str = "Action Input:";
pub(crate) const OBSERVATION: &str = "Observation:";
pub(crate) const FINAL_ANSWER: &str = "Final Answer:";

/// Raw model output did not match the protocol grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

/// A structurally valid model reply: exactly one of a tool call or a final
/// answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResponse {
    ToolCall {
        thought: String,
        action: String,
        action_input: String,
    },
    FinalAnswer {
        thought: String,
        answer: String,
    },
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Thought,
    ActionName,
    ActionInput,
    FinalAnswer,
}

/// Parse raw model output into a [`ModelResponse`].
///
/// The prompt ends with a `Thought:` cue, so leading free text before any
/// keyword is accepted as thought continuation. Everything else is strict:
/// an `Action:` without an `Action Input:`, a reply with neither an action
/// nor a final answer, or a reply with both, all fail.
pub fn parse_model_output(raw: &str) -> Result<ModelResponse, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError("model output is empty".to_string()));
    }

    let mut thought_parts: Vec<String> = Vec::new();
    let mut action: Option<String> = None;
    let mut action_input: Option<String> = None;
    let mut final_answer: Option<String> = None;
    // The prompt's trailing cue means the reply opens mid-thought.
    let mut section = Section::Thought;

    for line in raw.lines() {
        let trimmed = line.trim_start();

        // The model must stop before its first Observation; if it kept
        // going, everything from there on is fabricated and ignored.
        if trimmed.starts_with(OBSERVATION) {
            break;
        }

        if let Some(rest) = trimmed.strip_prefix(FINAL_ANSWER) {
            if action.is_some() {
                return Err(ParseError(
                    "output contains both an action and a final answer".to_string(),
                ));
            }
            if final_answer.is_some() {
                return Err(ParseError("duplicate 'Final Answer:'".to_string()));
            }
            final_answer = Some(rest.trim().to_string());
            section = Section::FinalAnswer;
        } else if let Some(rest) = trimmed.strip_prefix(ACTION_INPUT) {
            if final_answer.is_some() {
                return Err(ParseError(
                    "output contains both an action and a final answer".to_string(),
                ));
            }
            if action.is_none() {
                return Err(ParseError("'Action Input:' before 'Action:'".to_string()));
            }
            if action_input.is_some() {
                return Err(ParseError("duplicate 'Action Input:'".to_string()));
            }
            action_input = Some(rest.trim().to_string());
            section = Section::ActionInput;
        } else if let Some(rest) = trimmed.strip_prefix(ACTION) {
            if final_answer.is_some() {
                return Err(ParseError(
                    "output contains both an action and a final answer".to_string(),
                ));
            }
            if action.is_some() {
                return Err(ParseError("duplicate 'Action:'".to_string()));
            }
            action = Some(rest.trim().to_string());
            section = Section::ActionName;
        } else if let Some(rest) = trimmed.strip_prefix(THOUGHT) {
            if !rest.trim().is_empty() {
                thought_parts.push(rest.trim().to_string());
            }
            section = Section::Thought;
        } else if !trimmed.trim().is_empty() {
            let text = trimmed.trim_end();
            match section {
                Section::Thought => thought_parts.push(text.to_string()),
                Section::FinalAnswer => {
                    if let Some(answer) = final_answer.as_mut() {
                        answer.push('\n');
                        answer.push_str(text);
                    }
                }
                Section::ActionInput => {
                    if let Some(input) = action_input.as_mut() {
                        input.push('\n');
                        input.push_str(text);
                    }
                }
                // Trailing prose after the tool name has nowhere to go.
                Section::ActionName => {
                    return Err(ParseError(format!(
                        "unexpected text after 'Action:' line: {}",
                        text
                    )))
                }
            }
        }
    }

    let thought = thought_parts.join("\n");

    if let Some(answer) = final_answer {
        if answer.trim().is_empty() {
            return Err(ParseError("missing text after 'Final Answer:'".to_string()));
        }
        return Ok(ModelResponse::FinalAnswer { thought, answer });
    }

    match (action, action_input) {
        (Some(action), Some(action_input)) => {
            if action.is_empty() {
                return Err(ParseError("missing tool name after 'Action:'".to_string()));
            }
            Ok(ModelResponse::ToolCall {
                thought,
                action,
                action_input,
            })
        }
        (Some(_), None) => Err(ParseError(
            "'Action:' without a following 'Action Input:'".to_string(),
        )),
        _ => Err(ParseError(
            "expected 'Action:' and 'Action Input:' lines or a 'Final Answer:' line".to_string(),
        )),
    }
}
