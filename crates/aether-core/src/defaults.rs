//! Centralized default constants for the Aether search client.
//!
//! **This module is the single source of truth** for shared default values.
//! Session configuration, the HTTP backend and the CLI reference these
//! constants instead of defining their own magic numbers.

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Base URL of a locally running search engine.
pub const LOCAL_URL: &str = "http://localhost:8000";

/// Base URL of the hosted search engine.
pub const CLOUD_URL: &str = "https://aether-engine.up.railway.app";

/// Path of the health probe, relative to a base URL.
pub const HEALTH_PATH: &str = "/health";

/// Path of the autocomplete endpoint.
pub const SUGGEST_PATH: &str = "/suggest";

/// Path of the search endpoint.
pub const SEARCH_PATH: &str = "/search";

/// Path of the document upload endpoint.
pub const UPLOAD_PATH: &str = "/upload";

/// Multipart field name carrying the uploaded document.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Timeout for a single health probe (seconds).
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Timeout for suggest/search/upload requests (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// AUTOCOMPLETE
// =============================================================================

/// Quiet period after the last keystroke before a suggestion fetch fires.
pub const SUGGEST_DEBOUNCE_MS: u64 = 200;

/// Minimum free-text length (in characters) that triggers suggestions.
pub const SUGGEST_MIN_CHARS: usize = 2;

// =============================================================================
// PAGINATION
// =============================================================================

/// Fixed number of results shown per page.
pub const PAGE_SIZE: usize = 20;

// =============================================================================
// QUERY MARKERS
// =============================================================================

/// Marker appended to a query to request date ordering.
pub const DATE_MARKER: &str = "/date";

/// Prefix of the category marker; the filter value follows directly.
pub const CATEGORY_MARKER_PREFIX: &str = "/cat:";

// =============================================================================
// PRESENTATION
// =============================================================================

/// Acknowledgment shown when the upload endpoint returns no message.
pub const UPLOAD_ACK_FALLBACK: &str = "Upload started";

/// Acknowledgment shown when an upload request fails.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

/// Inline message surfaced when a search fails.
pub const SEARCH_FAILED_MESSAGE: &str = "Error loading results. Is the server running?";

/// Abstract page used to link results that carry no explicit URL.
pub const ARXIV_ABS_URL: &str = "https://arxiv.org/abs/";
