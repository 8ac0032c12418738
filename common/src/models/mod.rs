//! Shared data models.

pub mod connection;

// Re-export commonly used types
pub use connection::{BackendKind, ConnectionTarget};
