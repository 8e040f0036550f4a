//! Core types used throughout the crate.

pub mod config;
pub mod event;
pub mod message;
pub mod streaming;
pub mod todo;

// Re-export commonly used types
pub use config::*;
pub use event::*;
pub use message::*;
pub use streaming::*;
pub use todo::*;
