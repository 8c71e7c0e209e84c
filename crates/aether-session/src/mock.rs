//! Mock search backend for deterministic testing.
//!
//! Responses, failures and latencies are configured per base URL (health),
//! per token (suggest) and per composed query (search). Latency uses
//! `tokio::time::sleep`, so tests running with paused time can order
//! overlapping requests precisely.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aether_session::mock::MockBackend;
//!
//! let backend = MockBackend::new()
//!     .with_unhealthy("http://local")
//!     .with_suggestions("neu", ["neural", "neuron"]);
//! assert_eq!(backend.call_count("suggest"), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use aether_core::{
    ComposedQuery, Error, Result, SearchBackend, SearchResponse, SearchResult, UploadResponse,
};

/// Mock search backend for testing.
#[derive(Clone, Default)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    unhealthy: HashSet<String>,
    probe_latency: HashMap<String, Duration>,
    suggestions: HashMap<String, Vec<String>>,
    suggest_latency: Duration,
    suggest_fails: bool,
    search_responses: HashMap<String, SearchResponse>,
    search_latency: HashMap<String, Duration>,
    failing_searches: HashSet<String>,
    upload_message: Option<String>,
    upload_fails: bool,
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: &'static str,
    pub base: String,
    pub input: String,
}

impl MockBackend {
    /// Create a mock where every base is healthy, suggestions are empty and
    /// every search returns no results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the health probe of `base` fail.
    pub fn with_unhealthy(mut self, base: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).unhealthy.insert(base.into());
        self
    }

    /// Delay the health probe of `base`.
    pub fn with_probe_latency(mut self, base: impl Into<String>, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config)
            .probe_latency
            .insert(base.into(), latency);
        self
    }

    /// Suggestions returned for `token`.
    pub fn with_suggestions<I, S>(mut self, token: impl Into<String>, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.config)
            .suggestions
            .insert(token.into(), suggestions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_suggest_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).suggest_latency = latency;
        self
    }

    pub fn with_failing_suggest(mut self) -> Self {
        Arc::make_mut(&mut self.config).suggest_fails = true;
        self
    }

    /// Response returned for the composed query `query`.
    pub fn with_search_results(
        mut self,
        query: impl Into<String>,
        results: Vec<SearchResult>,
        time_ms: f64,
    ) -> Self {
        let total_results = results.len();
        Arc::make_mut(&mut self.config).search_responses.insert(
            query.into(),
            SearchResponse {
                results,
                elapsed_ms: Some(time_ms),
                total_results,
            },
        );
        self
    }

    pub fn with_search_latency(mut self, query: impl Into<String>, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config)
            .search_latency
            .insert(query.into(), latency);
        self
    }

    pub fn with_failing_search(mut self, query: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_searches
            .insert(query.into());
        self
    }

    pub fn with_upload_message(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).upload_message = Some(message.into());
        self
    }

    pub fn with_failing_upload(mut self) -> Self {
        Arc::make_mut(&mut self.config).upload_fails = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls of one operation ("probe", "suggest", "search", "upload").
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    fn record(&self, operation: &'static str, base: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation,
            base: base.to_string(),
            input: input.to_string(),
        });
    }
}

/// Build a result with only id and title set.
pub fn sample_result(id: impl Into<String>, title: impl Into<String>) -> SearchResult {
    SearchResult {
        id: id.into(),
        title: title.into(),
        authors: String::new(),
        summary: String::new(),
        url: None,
        score: 0.0,
        date: String::new(),
        category: String::new(),
    }
}

/// Build `n` numbered results.
pub fn sample_results(n: usize) -> Vec<SearchResult> {
    (0..n)
        .map(|i| sample_result(format!("doc-{}", i), format!("Document {}", i)))
        .collect()
}

async fn delay(latency: Option<Duration>) {
    if let Some(latency) = latency.filter(|d| !d.is_zero()) {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn probe_health(&self, base: &str) -> Result<()> {
        self.record("probe", base, "");
        delay(self.config.probe_latency.get(base).copied()).await;

        if self.config.unhealthy.contains(base) {
            return Err(Error::Probe(format!("{} is unreachable", base)));
        }
        Ok(())
    }

    async fn suggest(&self, base: &str, token: &str) -> Result<Vec<String>> {
        self.record("suggest", base, token);
        delay(Some(self.config.suggest_latency)).await;

        if self.config.suggest_fails {
            return Err(Error::Suggest("mock suggest failure".to_string()));
        }
        Ok(self
            .config
            .suggestions
            .get(token)
            .cloned()
            .unwrap_or_default())
    }

    async fn search(&self, base: &str, query: &ComposedQuery) -> Result<SearchResponse> {
        self.record("search", base, query.as_str());
        delay(self.config.search_latency.get(query.as_str()).copied()).await;

        if self.config.failing_searches.contains(query.as_str()) {
            return Err(Error::Search(format!("mock failure for '{}'", query)));
        }
        Ok(self
            .config
            .search_responses
            .get(query.as_str())
            .cloned()
            .unwrap_or(SearchResponse {
                results: Vec::new(),
                elapsed_ms: Some(0.0),
                total_results: 0,
            }))
    }

    async fn upload(&self, base: &str, file_name: &str, _bytes: Vec<u8>) -> Result<UploadResponse> {
        self.record("upload", base, file_name);

        if self.config.upload_fails {
            return Err(Error::Upload("mock upload failure".to_string()));
        }
        Ok(UploadResponse {
            message: self.config.upload_message.clone(),
        })
    }
}
