//! # react-agent
//!
//! A bounded ReAct-style reasoning/acting loop with pluggable tools.
//!
//! This library provides:
//! - An agent loop that alternates model reasoning with tool execution
//! - A fixed textual protocol (Thought / Action / Action Input / Observation /
//!   Final Answer) with a strict parser and one-shot parse recovery
//! - An immutable tool registry and a handful of offline demo tools
//! - Model transports: an OpenAI-compatible HTTP client and a scripted model
//!   for tests
//!
//! ## Architecture
//!
//! One run answers one query:
//! 1. Render a prompt from the protocol instructions, tool list, query, and
//!    scratchpad
//! 2. Call the model; parse its reply into a tool call or a final answer
//! 3. Execute the tool and append the round's observation to the scratchpad
//! 4. Repeat until a final answer or the iteration cap; per-round failures
//!    become observations the model can react to
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use react_agent::{agent::Agent, config::{Config, ModelConfig}, llm::OpenAiCompatClient, tools::{Calculator, ToolRegistry}};
//!
//! let mut tools = ToolRegistry::new();
//! tools.register(Arc::new(Calculator))?;
//! let model = Arc::new(OpenAiCompatClient::new(&ModelConfig::from_env()?)?);
//! let agent = Agent::new(Config::from_env()?, model, tools);
//! let answer = agent.run("What is 128 + 256 + 99?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

pub use agent::Agent;
pub use config::Config;
pub use error::AgentError;
