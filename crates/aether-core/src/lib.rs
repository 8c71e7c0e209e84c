//! # aether-core
//!
//! Core types, errors and the backend contract for the Aether search client.
//!
//! This crate provides the data model and trait definitions that the session
//! orchestrator (`aether-session`) and the command-line front end depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::SearchBackend;
