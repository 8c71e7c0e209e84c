//! Session controller: owns query, filter, suggestion, endpoint and result
//! state, and sequences resolver → compiler → fetch → paginator.
//!
//! Asynchronous flows are exposed in two phases (`begin_*` hands out a
//! request carrying a generation ticket, `finish_*` applies its outcome) so
//! that the `&mut Session` borrow is never held across a network call.
//! [`SharedSession`] wraps that pattern for callers that want overlapping
//! flows on one runtime.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aether_core::defaults::{SEARCH_FAILED_MESSAGE, UPLOAD_ACK_FALLBACK, UPLOAD_FAILED_MESSAGE};
use aether_core::{
    ActiveEndpoint, ComposedQuery, HealthStatus, QueryState, Result, SearchBackend,
    SearchResponse, SearchResult, ServerMode, UploadOutcome,
};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::endpoint::{EndpointResolver, ResolveRequest, Resolution};
use crate::generation::{Generation, Ticket};
use crate::paginator::Paginator;
use crate::query::compose;
use crate::suggest::{apply_suggestion, SuggestionDebouncer, SuggestionEvent, SuggestionStream};

/// Coarse state of the session, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    ResolvingEndpoint,
    Searching,
    Ready,
    Failed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ResolvingEndpoint => write!(f, "resolving endpoint"),
            Self::Searching => write!(f, "searching"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A submitted search that has not been sent yet.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub ticket: Ticket,
    pub request_id: Uuid,
    pub endpoint: String,
    pub query: ComposedQuery,
}

impl SearchRequest {
    pub async fn run(self, backend: &dyn SearchBackend) -> SearchOutcome {
        let started = Instant::now();
        let response = backend.search(&self.endpoint, &self.query).await;
        SearchOutcome {
            ticket: self.ticket,
            request_id: self.request_id,
            query: self.query,
            duration: started.elapsed(),
            response,
        }
    }
}

/// Result of running a [`SearchRequest`].
#[derive(Debug)]
pub struct SearchOutcome {
    pub ticket: Ticket,
    pub request_id: Uuid,
    pub query: ComposedQuery,
    pub duration: Duration,
    pub response: Result<SearchResponse>,
}

/// Summary line data for the current result set.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Results held by the paginator.
    pub result_count: usize,
    /// Total reported by the engine (legacy engines report more than they send).
    pub total_results: usize,
    pub elapsed_ms: Option<f64>,
    /// One-based page number.
    pub page: usize,
    pub total_pages: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FOUND {} RESULTS", self.total_results)?;
        if let Some(ms) = self.elapsed_ms {
            write!(f, " IN {}MS", ms)?;
        }
        write!(f, " | PAGE {} OF {}", self.page, self.total_pages)
    }
}

/// One user's search session.
pub struct Session {
    backend: Arc<dyn SearchBackend>,
    query: QueryState,
    resolver: EndpointResolver,
    debouncer: SuggestionDebouncer,
    suggestions: Vec<String>,
    paginator: Paginator,
    search_generation: Generation,
    phase: SessionPhase,
    /// Phase to return to once an endpoint resolution lands.
    settled: SessionPhase,
    elapsed_ms: Option<f64>,
    total_results: usize,
    last_error: Option<String>,
    last_query: Option<ComposedQuery>,
}

impl Session {
    /// Create a session and the stream its suggestion events arrive on.
    /// Feed the stream back through [`Session::apply_suggestion_event`].
    pub fn new(config: &SessionConfig, backend: Arc<dyn SearchBackend>) -> (Self, SuggestionStream) {
        let (debouncer, events) =
            SuggestionDebouncer::new(Arc::clone(&backend), config.suggest_debounce);
        let session = Self {
            backend,
            query: QueryState::default(),
            resolver: EndpointResolver::new(config),
            debouncer,
            suggestions: Vec::new(),
            paginator: Paginator::new(),
            search_generation: Generation::new(),
            phase: SessionPhase::Idle,
            settled: SessionPhase::Idle,
            elapsed_ms: None,
            total_results: 0,
            last_error: None,
            last_query: None,
        };
        (session, events)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn backend(&self) -> Arc<dyn SearchBackend> {
        Arc::clone(&self.backend)
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> ServerMode {
        self.resolver.mode()
    }

    pub fn endpoint(&self) -> &ActiveEndpoint {
        self.resolver.endpoint()
    }

    pub fn health(&self) -> HealthStatus {
        self.resolver.status()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Results on the current page.
    pub fn window(&self) -> &[SearchResult] {
        self.paginator.window()
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed_ms
    }

    /// Inline error of the last search, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Composed query of the last applied search.
    pub fn last_query(&self) -> Option<&ComposedQuery> {
        self.last_query.as_ref()
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            result_count: self.paginator.len(),
            total_results: self.total_results,
            elapsed_ms: self.elapsed_ms,
            page: self.paginator.page_index() + 1,
            total_pages: self.paginator.total_pages(),
        }
    }

    /// The query that `submit` would send right now.
    pub fn composed_query(&self) -> ComposedQuery {
        compose(&self.query)
    }

    // ------------------------------------------------------------------------
    // Query editing
    // ------------------------------------------------------------------------

    /// Replace the free text and let the debouncer propose suggestions.
    /// Requires a tokio runtime.
    pub fn set_free_text(&mut self, text: impl Into<String>) -> Option<Ticket> {
        self.query.free_text = text.into();
        let endpoint = self.resolver.endpoint().base_url.clone();
        self.debouncer.on_text_changed(&self.query.free_text, &endpoint)
    }

    pub fn set_sort_by_date(&mut self, sort_by_date: bool) {
        self.query.sort_by_date = sort_by_date;
    }

    pub fn toggle_sort_by_date(&mut self) -> bool {
        self.query.sort_by_date = !self.query.sort_by_date;
        self.query.sort_by_date
    }

    pub fn set_category_filter(&mut self, category: impl Into<String>) {
        self.query.category_filter = category.into();
    }

    /// Reset query and filters to their defaults and drop suggestions. The
    /// held results stay until the next search.
    pub fn clear(&mut self) {
        self.query = QueryState::default();
        self.suggestions.clear();
        self.debouncer.invalidate();
    }

    // ------------------------------------------------------------------------
    // Suggestions
    // ------------------------------------------------------------------------

    /// Apply an event from the suggestion stream. Stale events are dropped.
    pub fn apply_suggestion_event(&mut self, event: SuggestionEvent) -> bool {
        if !self.debouncer.is_current(event.ticket()) {
            debug!(
                subsystem = "session",
                component = "controller",
                generation = event.ticket().value(),
                "Dropping stale suggestion event"
            );
            return false;
        }
        match event {
            SuggestionEvent::Cleared { .. } => self.suggestions.clear(),
            SuggestionEvent::Suggestions { suggestions, .. } => self.suggestions = suggestions,
        }
        true
    }

    /// Replace the last token with `suggestion`, clear the list and make
    /// every outstanding suggestion fetch stale, in one step.
    pub fn select_suggestion(&mut self, suggestion: &str) {
        self.query.free_text = apply_suggestion(&self.query.free_text, suggestion);
        self.suggestions.clear();
        self.debouncer.invalidate();
    }

    /// Select the suggestion at `index` of the displayed list.
    pub fn select_suggestion_at(&mut self, index: usize) -> Option<String> {
        let suggestion = self.suggestions.get(index)?.clone();
        self.select_suggestion(&suggestion);
        Some(suggestion)
    }

    // ------------------------------------------------------------------------
    // Endpoint resolution
    // ------------------------------------------------------------------------

    /// Switch to `mode` and start resolving it, superseding any resolution
    /// in flight.
    pub fn begin_resolution(&mut self, mode: ServerMode) -> ResolveRequest {
        if self.phase != SessionPhase::Searching {
            self.phase = SessionPhase::ResolvingEndpoint;
        }
        self.resolver.begin(mode)
    }

    /// Apply a finished resolution. Returns false if it was stale.
    pub fn finish_resolution(&mut self, resolution: Resolution) -> bool {
        let applied = self.resolver.apply(resolution);
        if applied && self.phase == SessionPhase::ResolvingEndpoint {
            self.phase = self.settled;
        }
        applied
    }

    /// Resolve `mode` to completion.
    pub async fn set_mode(&mut self, mode: ServerMode) -> Resolution {
        let backend = Arc::clone(&self.backend);
        let resolution = self.begin_resolution(mode).run(backend.as_ref()).await;
        self.finish_resolution(resolution.clone());
        resolution
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Start a search for the current query. `None` when the free text is
    /// blank. Supersedes any search in flight.
    pub fn begin_search(&mut self) -> Option<SearchRequest> {
        if self.query.free_text.trim().is_empty() {
            return None;
        }

        let query = compose(&self.query);
        let ticket = self.search_generation.advance();
        let request_id = Uuid::now_v7();

        self.suggestions.clear();
        self.debouncer.invalidate();
        self.paginator.go_to_page(0);
        self.phase = SessionPhase::Searching;

        debug!(
            subsystem = "session",
            component = "controller",
            request_id = %request_id,
            generation = ticket.value(),
            endpoint = %self.resolver.endpoint(),
            query = %query,
            "Search submitted"
        );

        Some(SearchRequest {
            ticket,
            request_id,
            endpoint: self.resolver.endpoint().base_url.clone(),
            query,
        })
    }

    /// Apply a finished search. Returns false if a newer search superseded
    /// it.
    pub fn finish_search(&mut self, outcome: SearchOutcome) -> bool {
        if !self.search_generation.is_current(outcome.ticket) {
            debug!(
                subsystem = "session",
                component = "controller",
                request_id = %outcome.request_id,
                generation = outcome.ticket.value(),
                current = self.search_generation.current().value(),
                "Discarding stale search response"
            );
            return false;
        }

        match outcome.response {
            Ok(response) => {
                info!(
                    subsystem = "session",
                    component = "controller",
                    request_id = %outcome.request_id,
                    query = %outcome.query,
                    result_count = response.results.len(),
                    duration_ms = outcome.duration.as_millis() as u64,
                    "Search completed"
                );
                self.total_results = response.total_results;
                self.elapsed_ms = response.elapsed_ms;
                self.paginator.set_results(response.results);
                self.last_error = None;
                self.phase = SessionPhase::Ready;
            }
            Err(e) => {
                warn!(
                    subsystem = "session",
                    component = "controller",
                    request_id = %outcome.request_id,
                    query = %outcome.query,
                    error = %e,
                    "Search failed"
                );
                self.total_results = 0;
                self.paginator.clear();
                self.last_error = Some(SEARCH_FAILED_MESSAGE.to_string());
                self.phase = SessionPhase::Failed;
            }
        }
        self.settled = self.phase;
        self.last_query = Some(outcome.query);
        true
    }

    /// Submit the current query and wait for it. Returns whether a search
    /// was sent.
    pub async fn submit(&mut self) -> bool {
        let Some(request) = self.begin_search() else {
            return false;
        };
        let backend = Arc::clone(&self.backend);
        let outcome = request.run(backend.as_ref()).await;
        self.finish_search(outcome);
        true
    }

    // ------------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------------

    pub fn next_page(&mut self) -> bool {
        self.paginator.next_page()
    }

    pub fn prev_page(&mut self) -> bool {
        self.paginator.prev_page()
    }

    /// Jump to a zero-based page, clamped into range.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.paginator.go_to_page(page)
    }

    // ------------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------------

    /// Upload a document to the active endpoint. Never fails: the outcome
    /// is the acknowledgment to show the user.
    pub async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>) -> UploadOutcome {
        upload_to(
            self.backend.as_ref(),
            &self.resolver.endpoint().base_url,
            file_name,
            bytes,
        )
        .await
    }

    /// Read `path` and upload it.
    pub async fn upload_file(&self, path: &Path) -> UploadOutcome {
        match read_upload(path).await {
            Ok((name, bytes)) => self.upload_bytes(&name, bytes).await,
            Err(outcome) => outcome,
        }
    }
}

async fn read_upload(path: &Path) -> std::result::Result<(String, Vec<u8>), UploadOutcome> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok((name, bytes)),
        Err(e) => {
            warn!(
                subsystem = "session",
                component = "upload",
                path = %path.display(),
                error = %e,
                "Could not read document for upload"
            );
            Err(UploadOutcome::Failed(UPLOAD_FAILED_MESSAGE.to_string()))
        }
    }
}

async fn upload_to(
    backend: &dyn SearchBackend,
    endpoint: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> UploadOutcome {
    let size = bytes.len();
    match backend.upload(endpoint, file_name, bytes).await {
        Ok(response) => {
            info!(
                subsystem = "session",
                component = "upload",
                endpoint = %endpoint,
                file = %file_name,
                bytes = size,
                "Upload accepted"
            );
            UploadOutcome::Accepted(
                response
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| UPLOAD_ACK_FALLBACK.to_string()),
            )
        }
        Err(e) => {
            warn!(
                subsystem = "session",
                component = "upload",
                endpoint = %endpoint,
                file = %file_name,
                error = %e,
                "Upload failed"
            );
            UploadOutcome::Failed(UPLOAD_FAILED_MESSAGE.to_string())
        }
    }
}

/// A session shared between tasks. The lock is held only between
/// suspension points, never across a network call.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
    backend: Arc<dyn SearchBackend>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        let backend = session.backend();
        Self {
            inner: Arc::new(Mutex::new(session)),
            backend,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }

    /// Switch mode and resolve. Returns whether this resolution was applied.
    pub async fn set_mode(&self, mode: ServerMode) -> bool {
        let request = self.inner.lock().await.begin_resolution(mode);
        let resolution = request.run(self.backend.as_ref()).await;
        self.inner.lock().await.finish_resolution(resolution)
    }

    /// Submit the current query. Returns whether its outcome was applied.
    pub async fn submit(&self) -> bool {
        let Some(request) = self.inner.lock().await.begin_search() else {
            return false;
        };
        let outcome = request.run(self.backend.as_ref()).await;
        self.inner.lock().await.finish_search(outcome)
    }

    /// Replace the free text and submit it in one step.
    pub async fn search_text(&self, text: impl Into<String>) -> bool {
        let request = {
            let mut session = self.inner.lock().await;
            session.query.free_text = text.into();
            session.begin_search()
        };
        let Some(request) = request else {
            return false;
        };
        let outcome = request.run(self.backend.as_ref()).await;
        self.inner.lock().await.finish_search(outcome)
    }

    /// Read `path` and upload it to the endpoint active right now.
    pub async fn upload_file(&self, path: &Path) -> UploadOutcome {
        let endpoint = self.inner.lock().await.endpoint().base_url.clone();
        match read_upload(path).await {
            Ok((name, bytes)) => upload_to(self.backend.as_ref(), &endpoint, &name, bytes).await,
            Err(outcome) => outcome,
        }
    }

    /// Forward suggestion events into the session until the stream ends.
    pub fn spawn_suggestion_pump(&self, mut events: SuggestionStream) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                inner.lock().await.apply_suggestion_event(event);
            }
        })
    }
}
