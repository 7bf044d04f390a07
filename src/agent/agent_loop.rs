//! Core agent loop implementation.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::error::{AgentError, ErrorKind};
use crate::llm::LanguageModel;
use crate::tools::{ToolError, ToolRegistry};

use super::parser::{parse_model_output, ModelResponse};
use super::prompt::{build_correction_prompt, build_prompt};
use super::scratchpad::{Round, Scratchpad};

/// The reasoning/acting agent.
///
/// Holds the immutable tool registry and a model handle; each [`run`] is an
/// independent session with its own scratchpad, so one agent can serve any
/// number of concurrent queries.
///
/// [`run`]: Agent::run
pub struct Agent {
    config: Config,
    model: Arc<dyn LanguageModel>,
    tools: ToolRegistry,
}

impl Agent {
    /// Create a new agent. The registry is owned by the agent from here on
    /// and never mutated again.
    pub fn new(config: Config, model: Arc<dyn LanguageModel>, tools: ToolRegistry) -> Self {
        Self {
            config,
            model,
            tools,
        }
    }

    /// Answer a single query by running bounded reasoning/acting rounds.
    ///
    /// Each round makes one model call (plus at most one correction re-prompt
    /// after malformed output), executes at most one tool, and appends one
    /// scratchpad entry. Unknown tools, tool failures, and tool timeouts
    /// become Observations rather than errors. The run ends with the model's
    /// final answer, or with an [`AgentError`] carrying the full trace.
    ///
    /// Cancellation: drop the returned future. Every await point sits at a
    /// round boundary or inside a timed model/tool call.
    pub async fn run(&self, query: &str) -> Result<String, AgentError> {
        let run_id = Uuid::new_v4();
        let mut scratchpad = Scratchpad::new(self.config.max_iterations);

        tracing::debug!(run = %run_id, "starting: {}", truncate_for_log(query, 200));

        for iteration in 0..self.config.max_iterations {
            tracing::debug!(
                run = %run_id,
                "iteration {}/{}",
                iteration + 1,
                self.config.max_iterations
            );

            let prompt = build_prompt(query, &self.tools, &scratchpad);
            let raw = match self.complete_with_retry(&prompt).await {
                Ok(raw) => raw,
                Err(kind) => return Err(AgentError::new(kind, scratchpad)),
            };

            let response = match parse_model_output(&raw) {
                Ok(response) => response,
                Err(parse_err) if self.config.auto_recover_parse_errors => {
                    tracing::warn!(
                        run = %run_id,
                        "malformed model output ({}), re-prompting once",
                        parse_err
                    );
                    let correction = build_correction_prompt(query, &self.tools, &scratchpad, &raw);
                    let retried = match self.complete_with_retry(&correction).await {
                        Ok(raw) => raw,
                        Err(kind) => return Err(AgentError::new(kind, scratchpad)),
                    };
                    match parse_model_output(&retried) {
                        Ok(response) => response,
                        Err(parse_err) => {
                            return Err(AgentError::new(ErrorKind::Parse(parse_err), scratchpad))
                        }
                    }
                }
                Err(parse_err) => {
                    return Err(AgentError::new(ErrorKind::Parse(parse_err), scratchpad))
                }
            };

            match response {
                ModelResponse::FinalAnswer { answer, .. } => {
                    tracing::info!(
                        run = %run_id,
                        "final answer after {} round(s)",
                        scratchpad.len()
                    );
                    return Ok(answer);
                }
                ModelResponse::ToolCall {
                    thought,
                    action,
                    action_input,
                } => {
                    let observation = match self.execute_action(&action, &action_input).await {
                        Ok(output) => output,
                        // Failures feed back into the next round instead of
                        // ending the session.
                        Err(err) => {
                            tracing::warn!(run = %run_id, "{}", err);
                            err.to_string()
                        }
                    };
                    tracing::debug!(
                        run = %run_id,
                        tool = %action,
                        "observation: {}",
                        truncate_for_log(&observation, 500)
                    );
                    scratchpad.push(Round {
                        thought,
                        action,
                        action_input,
                        observation,
                    });
                }
            }
        }

        Err(AgentError::new(
            ErrorKind::IterationLimitExceeded(self.config.max_iterations),
            scratchpad,
        ))
    }

    /// Dispatch one tool invocation under the configured timeout.
    async fn execute_action(&self, action: &str, input: &str) -> Result<String, ToolError> {
        let tool = self.tools.get(action).ok_or_else(|| ToolError::Unknown {
            name: action.to_string(),
            available: self.tools.names(),
        })?;

        tracing::debug!(tool = %action, "invoking with input: {}", truncate_for_log(input, 200));

        match tokio::time::timeout(self.config.tool_timeout, tool.invoke(input)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(ToolError::Execution {
                name: action.to_string(),
                message: format!("{err:#}"),
            }),
            Err(_) => Err(ToolError::Timeout {
                name: action.to_string(),
                seconds: self.config.tool_timeout.as_secs(),
            }),
        }
    }

    /// Call the model under the configured timeout, retrying transport
    /// failures with exponential backoff up to the configured bound.
    async fn complete_with_retry(&self, prompt: &str) -> Result<String, ErrorKind> {
        let attempts = self.config.model_retries.max(1);
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let message = match tokio::time::timeout(
                self.config.model_timeout,
                self.model.complete(prompt),
            )
            .await
            {
                Ok(Ok(raw)) => return Ok(raw),
                Ok(Err(err)) => err.to_string(),
                Err(_) => format!(
                    "model call timed out after {}s",
                    self.config.model_timeout.as_secs()
                ),
            };

            if attempt >= attempts {
                return Err(ErrorKind::ModelTransport {
                    attempts: attempt,
                    message,
                });
            }

            tracing::warn!(
                "model call failed (attempt {}/{}): {}; retrying in {:?}",
                attempt,
                attempts,
                message,
                backoff
            );
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... [truncated]", &s[..cut])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::ScriptedModel;
    use crate::tools::{StaticLookup, Tool};

    fn test_config() -> Config {
        Config {
            retry_backoff: Duration::from_millis(1),
            ..Config::default()
        }
    }

    fn lookup_registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools
            .register(Arc::new(StaticLookup::new(
                "lookup",
                "Look up a fact by key.",
                [("capital of France", "Paris")],
                "No entry for",
            )))
            .unwrap();
        tools
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "flaky"
        }

        fn description(&self) -> &str {
            "Always fails."
        }

        async fn invoke(&self, _input: &str) -> anyhow::Result<String> {
            anyhow::bail!("backend unavailable")
        }
    }

    struct CountingTool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counter"
        }

        fn description(&self) -> &str {
            "Counts invocations."
        }

        async fn invoke(&self, _input: &str) -> anyhow::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("call {}", n + 1))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time."
        }

        async fn invoke(&self, _input: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    const FINAL: &str = "Thought: I now know the final answer.\nFinal Answer: Paris";

    #[tokio::test]
    async fn immediate_final_answer_makes_one_model_call() {
        let model = Arc::new(ScriptedModel::new([FINAL]));
        let agent = Agent::new(test_config(), model.clone(), lookup_registry());

        let answer = agent.run("What is the capital of France?").await.unwrap();
        assert_eq!(answer, "Paris");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn one_tool_round_then_final_answer() {
        let model = Arc::new(ScriptedModel::new([
            "Thought: I should look this up.\nAction: lookup\nAction Input: capital of France",
            FINAL,
        ]));
        let agent = Agent::new(test_config(), model.clone(), lookup_registry());

        let answer = agent.run("What is the capital of France?").await.unwrap();
        assert_eq!(answer, "Paris");
        assert_eq!(model.calls(), 2);
        // The second prompt carries the first round's observation.
        let prompts = model.prompts();
        assert!(prompts[1].contains("Observation: Paris"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_an_observation() {
        let model = Arc::new(ScriptedModel::new([
            "Thought: let me search the web.\nAction: web_search\nAction Input: capital of France",
            FINAL,
        ]));
        let agent = Agent::new(test_config(), model.clone(), lookup_registry());

        let answer = agent.run("What is the capital of France?").await.unwrap();
        assert_eq!(answer, "Paris");

        let prompts = model.prompts();
        assert!(prompts[1].contains("unknown tool 'web_search'"));
        assert!(prompts[1].contains("available: lookup"));
    }

    #[tokio::test]
    async fn failing_tool_exhausts_iterations() {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FailingTool)).unwrap();

        let round = "Thought: try the tool again.\nAction: flaky\nAction Input: anything";
        let config = Config {
            max_iterations: 3,
            ..test_config()
        };
        let model = Arc::new(ScriptedModel::new([round, round, round]));
        let agent = Agent::new(config, model.clone(), tools);

        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IterationLimitExceeded(3)));
        assert_eq!(err.trace.len(), 3);
        for round in err.trace.rounds() {
            assert!(round.observation.contains("backend unavailable"));
        }
        assert_eq!(
            err.last_observation(),
            Some("tool 'flaky' failed: backend unavailable")
        );
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn model_calls_never_exceed_the_iteration_cap() {
        let mut tools = ToolRegistry::new();
        tools
            .register(Arc::new(CountingTool {
                calls: AtomicUsize::new(0),
            }))
            .unwrap();

        let round = "Thought: keep counting.\nAction: counter\nAction Input: go";
        let config = Config {
            max_iterations: 4,
            ..test_config()
        };
        let model = Arc::new(ScriptedModel::new(vec![round; 10]));
        let agent = Agent::new(config, model.clone(), tools);

        let err = agent.run("count forever").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IterationLimitExceeded(4)));
        assert_eq!(model.calls(), 4);
        assert_eq!(err.trace.len(), 4);
    }

    #[tokio::test]
    async fn malformed_output_recovers_once_when_enabled() {
        let model = Arc::new(ScriptedModel::new([
            "sorry, I cannot use the format",
            FINAL,
        ]));
        let agent = Agent::new(test_config(), model.clone(), lookup_registry());

        let answer = agent.run("q").await.unwrap();
        assert_eq!(answer, "Paris");
        assert_eq!(model.calls(), 2);

        let prompts = model.prompts();
        assert!(prompts[1].contains("did not follow the required format"));
        assert!(prompts[1].contains("sorry, I cannot use the format"));
    }

    #[tokio::test]
    async fn repeated_malformed_output_is_a_parse_error() {
        let model = Arc::new(ScriptedModel::new([
            "sorry, I cannot use the format",
            "still not using the format",
        ]));
        let agent = Agent::new(test_config(), model.clone(), lookup_registry());

        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Parse(_)));
        assert!(err.trace.is_empty());
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn malformed_output_fails_immediately_when_recovery_disabled() {
        let config = Config {
            auto_recover_parse_errors: false,
            ..test_config()
        };
        let model = Arc::new(ScriptedModel::new([
            "sorry, I cannot use the format",
            FINAL,
        ]));
        let agent = Agent::new(config, model.clone(), lookup_registry());

        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Parse(_)));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_retried_then_fatal() {
        let config = Config {
            model_retries: 2,
            ..test_config()
        };
        let model = Arc::new(ScriptedModel::failing("connection refused"));
        let agent = Agent::new(config, model.clone(), lookup_registry());

        let err = agent.run("q").await.unwrap_err();
        match err.kind {
            ErrorKind::ModelTransport { attempts, message } => {
                assert_eq!(attempts, 2);
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn tool_timeout_becomes_an_observation() {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SlowTool)).unwrap();

        let config = Config {
            tool_timeout: Duration::from_millis(50),
            ..test_config()
        };
        let model = Arc::new(ScriptedModel::new([
            "Thought: this may take a while.\nAction: slow\nAction Input: go",
            FINAL,
        ]));
        let agent = Agent::new(config, model.clone(), tools);

        let answer = agent.run("q").await.unwrap();
        assert_eq!(answer, "Paris");

        let prompts = model.prompts();
        assert!(prompts[1].contains("tool 'slow' timed out"));
    }

    #[tokio::test]
    async fn scratchpad_grows_by_one_per_completed_round() {
        let round_a = "Thought: first.\nAction: lookup\nAction Input: capital of France";
        let round_b = "Thought: second.\nAction: lookup\nAction Input: something else";
        let config = Config {
            max_iterations: 2,
            ..test_config()
        };
        let model = Arc::new(ScriptedModel::new([round_a, round_b]));
        let agent = Agent::new(config, model.clone(), lookup_registry());

        let err = agent.run("q").await.unwrap_err();
        assert_eq!(err.trace.len(), 2);
        let rounds = err.trace.rounds();
        assert_eq!(rounds[0].thought, "first.");
        assert_eq!(rounds[0].observation, "Paris");
        assert_eq!(rounds[1].observation, "No entry for: something else");
        for round in rounds {
            assert!(!round.thought.is_empty());
            assert!(!round.action.is_empty());
            assert!(!round.observation.is_empty());
        }
    }
}
