mod cache_key;
mod chat;
mod collection;
mod point;
mod record;
mod sync_report;

pub use cache_key::*;
pub use chat::*;
pub use collection::*;
pub use point::*;
pub use record::*;
pub use sync_report::*;
