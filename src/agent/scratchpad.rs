//! The reasoning/action/observation history for one run.

use serde::{Deserialize, Serialize};

use super::parser::{ParseError, ACTION, ACTION_INPUT, FINAL_ANSWER, OBSERVATION, THOUGHT};

/// One completed reasoning round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub thought: String,
    pub action: String,
    pub action_input: String,
    /// Result of executing the action, written by the loop. On failure this
    /// holds the failure description instead of a tool result.
    pub observation: String,
}

/// Ordered, append-only log of rounds, bounded by the iteration cap.
///
/// Created fresh for each run and discarded when the run terminates; on
/// failure it travels inside [`crate::error::AgentError`] as the diagnostic
/// trace.
#[derive(Debug, Clone, Serialize)]
pub struct Scratchpad {
    rounds: Vec<Round>,
    limit: usize,
}

/// Parser state for [`Scratchpad::parse`]: the four protocol fields of the
/// round currently being read.
#[derive(Default)]
struct PartialRound {
    thought: Option<String>,
    action: Option<String>,
    action_input: Option<String>,
    observation: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Thought,
    Action,
    ActionInput,
    Observation,
}

impl PartialRound {
    fn is_empty(&self) -> bool {
        self.thought.is_none()
            && self.action.is_none()
            && self.action_input.is_none()
            && self.observation.is_none()
    }

    fn append(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Thought => &mut self.thought,
            Field::Action => &mut self.action,
            Field::ActionInput => &mut self.action_input,
            Field::Observation => &mut self.observation,
        };
        if let Some(value) = slot.as_mut() {
            value.push('\n');
            value.push_str(text);
        }
    }

    fn finish(self) -> Result<Round, ParseError> {
        match (self.thought, self.action, self.action_input, self.observation) {
            (Some(thought), Some(action), Some(action_input), Some(observation)) => Ok(Round {
                thought,
                action,
                action_input,
                observation,
            }),
            _ => Err(ParseError("incomplete round in scratchpad".to_string())),
        }
    }
}

impl Scratchpad {
    pub fn new(limit: usize) -> Self {
        Self {
            rounds: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Append a completed round. Returns `false` (and keeps the log
    /// unchanged) once the bound is reached.
    pub fn push(&mut self, round: Round) -> bool {
        if self.rounds.len() >= self.limit {
            return false;
        }
        self.rounds.push(round);
        true
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn at_capacity(&self) -> bool {
        self.rounds.len() >= self.limit
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Last observation recorded, if any round completed.
    pub fn last_observation(&self) -> Option<&str> {
        self.rounds.last().map(|r| r.observation.as_str())
    }

    /// Render the history in the fixed textual protocol, one keyword per
    /// line, rounds in chronological order. Every round ends with a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for round in &self.rounds {
            out.push_str(&format!("{} {}\n", THOUGHT, round.thought));
            out.push_str(&format!("{} {}\n", ACTION, round.action));
            out.push_str(&format!("{} {}\n", ACTION_INPUT, round.action_input));
            out.push_str(&format!("{} {}\n", OBSERVATION, round.observation));
        }
        out
    }

    /// Parse a rendered history back into its rounds. Inverse of [`render`]
    /// for any scratchpad whose field values do not themselves start with a
    /// protocol keyword.
    ///
    /// [`render`]: Scratchpad::render
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut rounds = Vec::new();
        let mut partial = PartialRound::default();
        let mut current: Option<Field> = None;

        for line in text.lines() {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix(THOUGHT) {
                if partial.thought.is_some() {
                    rounds.push(std::mem::take(&mut partial).finish()?);
                }
                partial.thought = Some(rest.trim().to_string());
                current = Some(Field::Thought);
            } else if let Some(rest) = trimmed.strip_prefix(ACTION_INPUT) {
                if partial.action.is_none() || partial.action_input.is_some() {
                    return Err(ParseError(
                        "misplaced 'Action Input:' in scratchpad".to_string(),
                    ));
                }
                partial.action_input = Some(rest.trim().to_string());
                current = Some(Field::ActionInput);
            } else if let Some(rest) = trimmed.strip_prefix(ACTION) {
                if partial.thought.is_none() || partial.action.is_some() {
                    return Err(ParseError("misplaced 'Action:' in scratchpad".to_string()));
                }
                partial.action = Some(rest.trim().to_string());
                current = Some(Field::Action);
            } else if let Some(rest) = trimmed.strip_prefix(OBSERVATION) {
                if partial.action_input.is_none() || partial.observation.is_some() {
                    return Err(ParseError(
                        "misplaced 'Observation:' in scratchpad".to_string(),
                    ));
                }
                partial.observation = Some(rest.trim().to_string());
                current = Some(Field::Observation);
            } else if trimmed.strip_prefix(FINAL_ANSWER).is_some() {
                return Err(ParseError(
                    "unexpected 'Final Answer:' in scratchpad".to_string(),
                ));
            } else if !trimmed.trim().is_empty() {
                match current {
                    Some(field) => partial.append(field, trimmed.trim_end()),
                    None => {
                        return Err(ParseError(format!(
                            "unexpected text outside any field: {}",
                            trimmed
                        )))
                    }
                }
            }
        }

        if !partial.is_empty() {
            rounds.push(partial.finish()?);
        }

        let limit = rounds.len();
        Ok(Self { rounds, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(n: usize) -> Round {
        Round {
            thought: format!("thought {}", n),
            action: "get_weather".to_string(),
            action_input: format!("city {}", n),
            observation: format!("observation {}", n),
        }
    }

    #[test]
    fn render_then_parse_reproduces_rounds() {
        let mut pad = Scratchpad::new(3);
        for n in 0..3 {
            assert!(pad.push(round(n)));
        }

        let parsed = Scratchpad::parse(&pad.render()).expect("round-trip parse");
        assert_eq!(parsed.rounds(), pad.rounds());
    }

    #[test]
    fn empty_scratchpad_round_trips() {
        let pad = Scratchpad::new(5);
        assert_eq!(pad.render(), "");

        let parsed = Scratchpad::parse("").expect("empty parse");
        assert!(parsed.is_empty());
    }

    #[test]
    fn push_stops_at_the_bound() {
        let mut pad = Scratchpad::new(2);
        assert!(pad.push(round(0)));
        assert!(pad.push(round(1)));
        assert!(pad.at_capacity());
        assert!(!pad.push(round(2)));
        assert_eq!(pad.len(), 2);
    }

    #[test]
    fn multiline_observation_survives_parse() {
        let text = "Thought: check\nAction: lookup\nAction Input: key\nObservation: line one\nline two\n";
        let parsed = Scratchpad::parse(text).expect("parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.rounds()[0].observation, "line one\nline two");
    }

    #[test]
    fn incomplete_round_is_an_error() {
        let text = "Thought: check\nAction: lookup\n";
        assert!(Scratchpad::parse(text).is_err());
    }

    #[test]
    fn final_answer_does_not_belong_in_a_scratchpad() {
        let text = "Thought: done\nFinal Answer: 42\n";
        assert!(Scratchpad::parse(text).is_err());
    }

    #[test]
    fn last_observation_tracks_the_latest_round() {
        let mut pad = Scratchpad::new(2);
        assert_eq!(pad.last_observation(), None);
        pad.push(round(0));
        pad.push(round(1));
        assert_eq!(pad.last_observation(), Some("observation 1"));
    }
}
