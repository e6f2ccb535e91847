// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod types;
pub mod view;

// Re-exports
pub use client::{Backend, HttpBackend};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
