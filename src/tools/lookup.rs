//! Static key/value lookup tool.
//!
//! Stands in for external data sources (a weather service, an employee
//! directory) with an in-memory table, so demos and tests run without any
//! network access.

use std::collections::HashMap;

use async_trait::async_trait;

use super::Tool;

/// A named tool that answers queries from a fixed table.
pub struct StaticLookup {
    name: String,
    description: String,
    table: HashMap<String, String>,
    miss_message: String,
}

impl StaticLookup {
    /// Build a lookup tool. `miss_message` is returned verbatim with the
    /// unmatched key appended when a lookup misses.
    pub fn new<I, K, V>(
        name: impl Into<String>,
        description: impl Into<String>,
        entries: I,
        miss_message: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            table: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            miss_message: miss_message.into(),
        }
    }
}

#[async_trait]
impl Tool for StaticLookup {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        let key = input.trim();
        match self.table.get(key) {
            Some(value) => Ok(value.clone()),
            None => Ok(format!("{}: {}", self.miss_message, key)),
        }
    }
}
