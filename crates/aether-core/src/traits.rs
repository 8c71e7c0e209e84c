//! Backend contract consumed by the session orchestrator.
//!
//! Every call takes the base URL explicitly: the active endpoint changes
//! at runtime, and a single backend instance serves both the local and the
//! cloud engine.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ComposedQuery, SearchResponse, UploadResponse};

/// Remote document-search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// `GET {base}/health`. `Ok(())` on any 2xx; `Error::Probe` otherwise.
    async fn probe_health(&self, base: &str) -> Result<()>;

    /// `GET {base}/suggest?q={token}`. Returns the `suggestions` array.
    async fn suggest(&self, base: &str, token: &str) -> Result<Vec<String>>;

    /// `GET {base}/search?q={query}`.
    async fn search(&self, base: &str, query: &ComposedQuery) -> Result<SearchResponse>;

    /// `POST {base}/upload` with a single multipart file field.
    async fn upload(&self, base: &str, file_name: &str, bytes: Vec<u8>)
        -> Result<UploadResponse>;
}
