use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::rest_url::rest_url;
use crate::application::RecordSource;
use crate::domain::{DomainError, Record};

/// Calls a Postgres stored procedure through Supabase's PostgREST `rpc` endpoint.
pub struct SupabaseRecordSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseRecordSource {
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl RecordSource for SupabaseRecordSource {
    async fn fetch(&self, procedure: &str, limit: usize) -> Result<Vec<Record>, DomainError> {
        let url = rest_url(&self.base_url, &["rest", "v1", "rpc", procedure])?;
        debug!("Calling {} with limit {}", procedure, limit);

        let response = self
            .client
            .post(url)
            .query(&[("limit", limit)])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| DomainError::source(format!("Failed to call {}: {}", procedure, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Supabase returned {} for {}: {}", status, procedure, body);
            return Err(DomainError::source(format!(
                "Procedure {} returned {}",
                procedure, status
            )));
        }

        let rows: Vec<Map<String, Value>> = response.json().await.map_err(|e| {
            DomainError::source(format!("Failed to parse rows from {}: {}", procedure, e))
        })?;

        Ok(rows.into_iter().map(Record::from_row).collect())
    }
}
