use anyhow::Result;
use serde_json::{json, Value};

use crate::domain::ScoredPoint;

use super::super::Container;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(&self, query: String, num: usize, as_json: bool) -> Result<String> {
        let use_case = self.container.retrieve_use_case();
        let results = use_case.execute(&query, num).await?;

        if as_json {
            let payloads: Vec<Value> = results
                .iter()
                .map(|r| json!({ "score": r.score(), "record": r.payload() }))
                .collect();
            return Ok(serde_json::to_string_pretty(&payloads)?);
        }

        Ok(self.format_results(&results))
    }

    fn format_results(&self, results: &[ScoredPoint]) -> String {
        if results.is_empty() {
            return "No results found.".to_string();
        }

        let mut output = format!("Found {} results:\n\n", results.len());

        for (i, result) in results.iter().enumerate() {
            let name = result
                .payload()
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            output.push_str(&format!(
                "{}. {} [id {}] (score: {:.3})\n",
                i + 1,
                name,
                result.id(),
                result.score()
            ));

            if let Some(description) = result.payload().get("description").and_then(Value::as_str) {
                output.push_str(&format!("   {}\n", description));
            }
        }

        output
    }
}
