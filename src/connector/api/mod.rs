pub mod container;
pub mod controller;
pub mod router;
mod settings;

pub use container::{Container, ContainerConfig};
pub use router::Router;
pub use settings::*;
