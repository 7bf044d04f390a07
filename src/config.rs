//! Configuration for the agent loop and the model transport.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required (binary only). API key for the model endpoint.
//! - `MODEL_BASE_URL` - Optional. OpenAI-compatible API base. Defaults to `https://openrouter.ai/api/v1`.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `deepseek/deepseek-chat`.
//! - `MAX_ITERATIONS` - Optional. Maximum reasoning/acting rounds per query. Defaults to `5`.
//! - `AUTO_RECOVER_PARSE_ERRORS` - Optional. Re-prompt once on malformed model output. Defaults to `true`.
//! - `MODEL_TIMEOUT_SECS` - Optional. Per-call model deadline. Defaults to `60`.
//! - `TOOL_TIMEOUT_SECS` - Optional. Per-call tool deadline. Defaults to `30`.
//! - `MODEL_RETRIES` - Optional. Transport attempts per model call. Defaults to `3`.
//! - `RETRY_BACKOFF_MS` - Optional. Initial backoff between transport retries. Defaults to `500`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Loop behavior for one agent.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum reasoning/acting rounds per query
    pub max_iterations: usize,

    /// Re-prompt once with a format reminder when model output fails to parse
    pub auto_recover_parse_errors: bool,

    /// Deadline for a single model call
    pub model_timeout: Duration,

    /// Deadline for a single tool invocation
    pub tool_timeout: Duration,

    /// Transport attempts per model call (at least 1)
    pub model_retries: u32,

    /// Initial backoff between transport retries; doubles per retry
    pub retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            auto_recover_parse_errors: true,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
            model_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let max_iterations = env_parse("MAX_ITERATIONS", defaults.max_iterations)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let auto_recover_parse_errors = match std::env::var("AUTO_RECOVER_PARSE_ERRORS") {
            Ok(value) => parse_bool(&value).map_err(|e| {
                ConfigError::InvalidValue("AUTO_RECOVER_PARSE_ERRORS".to_string(), e)
            })?,
            Err(_) => defaults.auto_recover_parse_errors,
        };

        let model_retries: u32 = env_parse("MODEL_RETRIES", defaults.model_retries)?;
        if model_retries == 0 {
            return Err(ConfigError::InvalidValue(
                "MODEL_RETRIES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_iterations,
            auto_recover_parse_errors,
            model_timeout: Duration::from_secs(env_parse(
                "MODEL_TIMEOUT_SECS",
                defaults.model_timeout.as_secs(),
            )?),
            tool_timeout: Duration::from_secs(env_parse(
                "TOOL_TIMEOUT_SECS",
                defaults.tool_timeout.as_secs(),
            )?),
            model_retries,
            retry_backoff: Duration::from_millis(env_parse(
                "RETRY_BACKOFF_MS",
                defaults.retry_backoff.as_millis() as u64,
            )?),
        })
    }

    /// Create a config with custom loop bounds (useful for testing).
    pub fn new(max_iterations: usize, auto_recover_parse_errors: bool) -> Self {
        Self {
            max_iterations,
            auto_recover_parse_errors,
            ..Self::default()
        }
    }
}

/// Model endpoint credentials for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Model identifier in the endpoint's format
    pub model: String,
}

impl ModelConfig {
    /// Load the model endpoint configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let base_url = std::env::var("MODEL_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());

        let model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "deepseek/deepseek-chat".to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}
