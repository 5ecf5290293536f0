pub mod config;
pub mod error;
pub mod local;
pub mod node;

pub use config::Config;
pub use error::{O3AdminError, Result};
pub use local::LocalAdmin;
pub use node::Node;

// Re-export key types from workspace crates
pub use api;
pub use network;
pub use quorum;
pub use storage;
pub use system;
