//! Structured logging field names for values recorded on spans after the
//! fact (`Span::record`), where the field name is passed as a string.
//!
//! Event fields written inline in `tracing` macros use the same names:
//! `subsystem`, `component`, `op`, `request_id`, `generation`, `mode`,
//! `endpoint`, `query`, `error`.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Unexpected client-side failure |
//! | WARN  | Recoverable issue, fallback applied (probe/suggest failure) |
//! | INFO  | Operation completions (search, resolution, upload) |
//! | DEBUG | Decision points: stale discards, debounce reschedules |
//! | TRACE | Per-item data (individual suggestions, result ids) |

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of suggestions returned.
pub const SUGGESTION_COUNT: &str = "suggestion_count";
