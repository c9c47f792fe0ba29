use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{ChatController, SearchController, SyncController, WarmController};

pub struct Router<'a> {
    sync_controller: SyncController<'a>,
    search_controller: SearchController<'a>,
    warm_controller: WarmController<'a>,
    chat_controller: ChatController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            sync_controller: SyncController::new(container),
            search_controller: SearchController::new(container),
            warm_controller: WarmController::new(container),
            chat_controller: ChatController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Sync {
                collection,
                batch_size,
                limit,
            } => self.sync_controller.sync(collection, batch_size, limit).await,
            Commands::Search { query, num, json } => {
                self.search_controller.search(query, num, json).await
            }
            Commands::Warm { keep_alive } => self.warm_controller.warm(keep_alive).await,
            Commands::Chat {
                prompt,
                system,
                legacy,
            } => self.chat_controller.chat(prompt, system, legacy).await,
        }
    }
}
