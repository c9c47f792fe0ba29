use anyhow::Result;

use crate::domain::ChatMessage;

use super::super::Container;

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn chat(&self, prompt: String, system: Option<String>, legacy: bool) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let client = self.container.chat_client().await?;
        let reply = if legacy {
            client.generate(&messages).await?
        } else {
            client.chat(&messages).await?
        };

        Ok(reply)
    }
}
