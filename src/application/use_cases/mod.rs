mod preload_resources;
mod retrieve_records;
mod sync_records;

pub use preload_resources::*;
pub use retrieve_records::*;
pub use sync_records::*;
