pub mod chat_controller;
pub mod search_controller;
pub mod sync_controller;
pub mod warm_controller;

pub use chat_controller::ChatController;
pub use search_controller::SearchController;
pub use sync_controller::SyncController;
pub use warm_controller::WarmController;
