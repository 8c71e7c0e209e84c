//! # aether-session
//!
//! Search session orchestration for the Aether client.
//!
//! This crate provides:
//! - Endpoint resolution between a local and a hosted engine
//! - Debounced autocomplete for the last typed token
//! - Query composition with inline filter markers
//! - Client-side pagination of search results
//! - The session controller that sequences all of the above
//! - An HTTP implementation of [`aether_core::SearchBackend`]
//!
//! Every asynchronous flow carries a generation ticket; only the outcome of
//! the most recently issued flow of each kind is ever applied.
//!
//! # Feature Flags
//!
//! - `mock`: Expose [`mock::MockBackend`] for downstream tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aether_session::{HttpBackend, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SessionConfig::from_env().unwrap();
//!     let backend = Arc::new(HttpBackend::new(&config).unwrap());
//!     let (mut session, _suggestions) = Session::new(&config, backend);
//!     session.set_category_filter("cs.LG");
//!     session.set_free_text("graph neural");
//!     session.submit().await;
//!     println!("{}", session.stats());
//! }
//! ```

pub mod config;
pub mod endpoint;
pub mod generation;
pub mod http;
pub mod paginator;
pub mod query;
pub mod session;
pub mod suggest;

// Mock search backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{ConfigError, ConfigResult, SessionConfig};
pub use endpoint::{EndpointResolver, ResolveRequest, Resolution};
pub use generation::{Generation, SharedGeneration, Ticket};
pub use http::HttpBackend;
pub use paginator::Paginator;
pub use query::compose;
pub use session::{
    SearchOutcome, SearchRequest, SearchStats, Session, SessionPhase, SharedSession,
};
pub use suggest::{apply_suggestion, SuggestionDebouncer, SuggestionEvent, SuggestionStream};
