use anyhow::Result;

use super::super::Container;

pub struct WarmController<'a> {
    container: &'a Container,
}

impl<'a> WarmController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Loads and warms the embedding model and chat client, then reports
    /// what the cache holds.
    pub async fn warm(&self, keep_alive: Option<i64>) -> Result<String> {
        let model = &self.container.settings().embedding_model;
        let info = self
            .container
            .preload_use_case()
            .with_keep_alive(keep_alive)
            .execute(model)
            .await?;
        Ok(serde_json::to_string_pretty(&info)?)
    }
}
