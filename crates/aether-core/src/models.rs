//! Data model shared by the session orchestrator and its backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::defaults;
use crate::error::Error;

// =============================================================================
// SERVER MODE / HEALTH
// =============================================================================

/// Which backend instance the user wants to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    /// Probe the local instance, fall back to the cloud one.
    Auto,
    /// Always use the local instance.
    #[default]
    Local,
    /// Always use the cloud instance.
    Cloud,
}

impl FromStr for ServerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "local" => Ok(Self::Local),
            "cloud" => Ok(Self::Cloud),
            _ => Err(Error::InvalidInput(format!(
                "unknown server mode '{}', expected auto, local or cloud",
                s
            ))),
        }
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Local => write!(f, "local"),
            Self::Cloud => write!(f, "cloud"),
        }
    }
}

/// Reachability of the active endpoint, as derived by the last resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// A resolution is in flight.
    #[default]
    Checking,
    /// The local instance answered its health probe.
    OnlineLocal,
    /// The cloud instance is in use (probed, or assumed in auto mode).
    OnlineCloud,
    /// The explicitly selected instance failed its probe.
    Offline,
}

impl HealthStatus {
    /// True when the status indicator should read as reachable.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::OnlineLocal | Self::OnlineCloud)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::OnlineLocal => write!(f, "online (local)"),
            Self::OnlineCloud => write!(f, "online (cloud)"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Which of the two configured bases is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Local,
    Cloud,
}

/// The base URL all backend calls are issued against.
///
/// Only constructed from one of the two configured bases, so it is never
/// empty once a session exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveEndpoint {
    pub kind: EndpointKind,
    pub base_url: String,
}

impl ActiveEndpoint {
    pub fn as_str(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Display for ActiveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

// =============================================================================
// QUERY STATE
// =============================================================================

/// Free text plus structured filters, as edited by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub free_text: String,
    pub sort_by_date: bool,
    /// Category code such as `cs.LG`; empty means no filter.
    pub category_filter: String,
}

impl QueryState {
    pub fn new(free_text: impl Into<String>) -> Self {
        Self {
            free_text: free_text.into(),
            ..Default::default()
        }
    }

    pub fn with_sort_by_date(mut self, sort_by_date: bool) -> Self {
        self.sort_by_date = sort_by_date;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_filter = category.into();
        self
    }

    /// Last whitespace-delimited token of the free text, the key for
    /// autocomplete requests.
    pub fn last_token(&self) -> &str {
        last_token(&self.free_text)
    }
}

/// Last whitespace-delimited token of `text`; empty when `text` ends in
/// whitespace or is blank.
pub fn last_token(text: &str) -> &str {
    if text.ends_with(char::is_whitespace) {
        return "";
    }
    text.split_whitespace().next_back().unwrap_or("")
}

/// The exact string sent to the search endpoint, including marker suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ComposedQuery(String);

impl ComposedQuery {
    pub fn new(query: String) -> Self {
        Self(query)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComposedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// SEARCH RESULTS
// =============================================================================

/// One document hit returned by the search endpoint.
///
/// Deserialization is lenient: engines in the wild disagree on the shape of
/// `authors`, `score` and `id`, and omit or null out fields they have no
/// value for. Missing and null text fields read as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "authors_list")]
    pub authors: String,
    #[serde(
        default,
        rename = "abstract",
        alias = "snippet",
        deserialize_with = "null_as_empty"
    )]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
}

impl SearchResult {
    /// Link to the document: the explicit URL when present, otherwise the
    /// arXiv abstract page for the id. `None` when the engine sent neither.
    pub fn link(&self) -> Option<String> {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() && url != "#" => Some(url.to_string()),
            _ if !self.id.is_empty() => Some(format!("{}{}", defaults::ARXIV_ABS_URL, self.id)),
            _ => None,
        }
    }
}

/// Outcome of one search request, normalized across response shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Server-reported elapsed time in milliseconds, when reported.
    pub elapsed_ms: Option<f64>,
    /// Total hit count reported by legacy engines; defaults to
    /// `results.len()`.
    pub total_results: usize,
}

/// Wire shape of the search endpoint. Accepts both the current
/// `{results, time_ms}` body and the legacy
/// `{results, total_results, time_taken}` one.
#[derive(Debug, Deserialize)]
struct SearchResponseWire {
    #[serde(default)]
    results: Option<Vec<SearchResult>>,
    #[serde(default)]
    time_ms: Option<f64>,
    #[serde(default)]
    total_results: Option<usize>,
    #[serde(default, deserialize_with = "optional_lenient_number")]
    time_taken: Option<f64>,
}

impl<'de> Deserialize<'de> for SearchResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SearchResponseWire::deserialize(deserializer)?;
        let results = wire.results.unwrap_or_default();
        // time_taken is reported in seconds.
        let elapsed_ms = wire
            .time_ms
            .or_else(|| wire.time_taken.map(|secs| secs * 1000.0));
        let total_results = wire.total_results.unwrap_or(results.len());
        Ok(Self {
            results,
            elapsed_ms,
            total_results,
        })
    }
}

/// Body of the suggest endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

/// Body of the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// User-visible acknowledgment of an upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum UploadOutcome {
    Accepted(String),
    Failed(String),
}

impl UploadOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted(m) | Self::Failed(m) => m,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::String(s)) => s,
        Some(StringOrNumber::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Authors {
    One(String),
    Many(Vec<String>),
}

fn authors_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Authors>::deserialize(deserializer)? {
        Some(Authors::One(s)) => s,
        Some(Authors::Many(list)) => list.join(", "),
        None => String::new(),
    })
}

fn parse_lenient<E: serde::de::Error>(value: StringOrNumber) -> Result<f64, E> {
    match value {
        StringOrNumber::Number(n) => n
            .as_f64()
            .ok_or_else(|| E::custom(format!("number out of range: {}", n))),
        StringOrNumber::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("expected a number, got '{}'", s))),
    }
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(value) => parse_lenient(value),
        None => Ok(0.0),
    }
}

fn optional_lenient_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer)?
        .map(parse_lenient)
        .transpose()
}
