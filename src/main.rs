//! react-agent - CLI entry point.
//!
//! Answers one question from the command line using the demo tool set.

use std::sync::Arc;

use react_agent::agent::Agent;
use react_agent::config::{Config, ModelConfig};
use react_agent::llm::OpenAiCompatClient;
use react_agent::tools::{Calculator, CurrentTime, StaticLookup, ToolRegistry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "react_agent=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let model_config = ModelConfig::from_env()?;
    info!(
        "Loaded configuration: model={} max_iterations={}",
        model_config.model, config.max_iterations
    );

    let model = Arc::new(OpenAiCompatClient::new(&model_config)?);
    let tools = demo_registry()?;
    let agent = Agent::new(config, model, tools);

    let query: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let query = if query.trim().is_empty() {
        "Do I need an umbrella in Shanghai today?".to_string()
    } else {
        query
    };

    match agent.run(&query).await {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(err) => {
            if let Some(observation) = err.last_observation() {
                eprintln!("last observation: {}", observation);
            }
            if !err.trace.is_empty() {
                eprintln!("--- trace ---\n{}", err.trace.render());
            }
            Err(anyhow::anyhow!("agent failed: {}", err))
        }
    }
}

/// Offline stand-ins for the external services a deployment would wire in.
fn demo_registry() -> anyhow::Result<ToolRegistry> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(Calculator))?;
    tools.register(Arc::new(CurrentTime))?;

    tools.register(Arc::new(StaticLookup::new(
        "get_weather",
        "Look up today's weather for a city. Use when the user asks about weather, temperature, or whether to bring an umbrella. Input: a city name, e.g. Beijing, Shanghai.",
        [
            ("Beijing", "Sunny, -2 to 8C, light northwest wind, no umbrella needed"),
            ("Shanghai", "Light rain, 5 to 12C, southeast breeze, bring an umbrella"),
            ("Guangzhou", "Cloudy, 15 to 22C, no umbrella needed"),
            ("Chengdu", "Overcast, 6 to 14C, possible drizzle, consider an umbrella"),
        ],
        "No weather data for",
    )))?;

    tools.register(Arc::new(StaticLookup::new(
        "search_employee",
        "Look up an employee in the company directory. Use when the user asks about someone's role, department, or email. Input: the employee's name.",
        [
            ("Zhang San", "Zhang San: backend engineer, Engineering, zhangsan@company.com"),
            ("Li Si", "Li Si: product manager, Product, lisi@company.com"),
            ("Wang Wu", "Wang Wu: AI engineer, Engineering, wangwu@company.com"),
        ],
        "No employee named",
    )))?;

    Ok(tools)
}
