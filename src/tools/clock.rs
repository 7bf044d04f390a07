//! Current date/time tool.

use async_trait::async_trait;
use chrono::Utc;

use super::Tool;

/// Report the current date, time, and weekday (UTC).
pub struct CurrentTime;

#[async_trait]
impl Tool for CurrentTime {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Use when the user asks what time it is, today's date, or the day of the week. Input is ignored."
    }

    async fn invoke(&self, _input: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        Ok(format!(
            "Current time: {} UTC, {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            now.format("%A")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_a_timestamp_and_weekday() {
        let out = tokio_test::block_on(CurrentTime.invoke("")).unwrap();
        assert!(out.starts_with("Current time: "));
        assert!(out.contains("UTC"));
        // Weekday names all end in "day".
        assert!(out.trim_end().ends_with("day"));
    }
}
