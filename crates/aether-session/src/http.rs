//! HTTP search backend.
//!
//! Talks to a search engine over its JSON API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | probe     | `GET {base}/health` |
//! | suggest   | `GET {base}/suggest?q={token}` |
//! | search    | `GET {base}/search?q={composed query}` |
//! | upload    | `POST {base}/upload` (multipart, field `file`) |

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, field, instrument, warn, Span};

use aether_core::defaults::{HEALTH_PATH, SEARCH_PATH, SUGGEST_PATH, UPLOAD_FIELD, UPLOAD_PATH};
use aether_core::logging;
use aether_core::{
    ComposedQuery, Error, Result, SearchBackend, SearchResponse, SuggestResponse, UploadResponse,
};

use crate::config::SessionConfig;

/// [`SearchBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    probe_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            probe_timeout: config.probe_timeout,
        })
    }
}

fn url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[async_trait]
impl SearchBackend for HttpBackend {
    #[instrument(skip(self), fields(subsystem = "http", op = "probe"))]
    async fn probe_health(&self, base: &str) -> Result<()> {
        let response = self
            .client
            .get(url(base, HEALTH_PATH))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| Error::Probe(format!("Health probe failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Probe(format!(
                "Health probe returned {}",
                response.status()
            )));
        }
        debug!("Health probe passed");
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "http", op = "suggest", suggestion_count = field::Empty))]
    async fn suggest(&self, base: &str, token: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(url(base, SUGGEST_PATH))
            .query(&[("q", token)])
            .send()
            .await
            .map_err(|e| Error::Suggest(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Suggest(format!("Engine returned {}: {}", status, body)));
        }

        let body: SuggestResponse = response
            .json()
            .await
            .map_err(|e| Error::Suggest(format!("Failed to parse response: {}", e)))?;

        Span::current().record(logging::SUGGESTION_COUNT, body.suggestions.len());
        Ok(body.suggestions)
    }

    #[instrument(
        skip(self, query),
        fields(subsystem = "http", op = "search", query = %query, result_count = field::Empty, duration_ms = field::Empty)
    )]
    async fn search(&self, base: &str, query: &ComposedQuery) -> Result<SearchResponse> {
        let start = Instant::now();

        let response = self
            .client
            .get(url(base, SEARCH_PATH))
            .query(&[("q", query.as_str())])
            .send()
            .await
            .map_err(|e| Error::Search(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Search endpoint returned an error status");
            return Err(Error::Search(format!("Engine returned {}: {}", status, body)));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Search(format!("Failed to parse response: {}", e)))?;

        let span = Span::current();
        span.record(logging::RESULT_COUNT, body.results.len());
        span.record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        debug!(total_results = body.total_results, "Search response received");
        Ok(body)
    }

    #[instrument(skip(self, bytes), fields(subsystem = "http", op = "upload", size = bytes.len()))]
    async fn upload(&self, base: &str, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(url(base, UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!("Engine returned {}: {}", status, body)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Upload(format!("Failed to read response: {}", e)))?;
        // An empty body acknowledges without a message.
        if text.trim().is_empty() {
            return Ok(UploadResponse::default());
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::Upload(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(url("http://localhost:8000", "/health"), "http://localhost:8000/health");
        assert_eq!(url("http://localhost:8000/", "/search"), "http://localhost:8000/search");
    }

    #[test]
    fn test_new_from_default_config() {
        let backend = HttpBackend::new(&SessionConfig::default()).unwrap();
        assert_eq!(backend.probe_timeout, Duration::from_secs(5));
    }
}
