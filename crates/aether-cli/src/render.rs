//! Plain-text rendering of session state.

use aether_core::{ActiveEndpoint, HealthStatus, SearchResult, ServerMode};
use aether_session::Session;

const SUMMARY_CHARS: usize = 240;

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

pub fn result(position: usize, result: &SearchResult) -> String {
    let mut out = format!("[{}] {}", position, result.title.trim());
    if result.score > 0.0 {
        out.push_str(&format!(" ({:.2})", result.score));
    }

    let meta: Vec<&str> = [
        result.authors.as_str(),
        result.date.as_str(),
        result.category.as_str(),
    ]
    .into_iter()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect();
    if !meta.is_empty() {
        out.push_str("\n    ");
        out.push_str(&meta.join(" | "));
    }
    if !result.summary.trim().is_empty() {
        out.push_str("\n    ");
        out.push_str(&truncate(&result.summary, SUMMARY_CHARS));
    }
    if let Some(link) = result.link() {
        out.push_str("\n    ");
        out.push_str(&link);
    }
    out
}

pub fn endpoint(mode: ServerMode, endpoint: &ActiveEndpoint, status: HealthStatus) -> String {
    let marker = if status.is_online() { "+" } else { "-" };
    format!("[{}] mode {} | {} | {}", marker, mode, endpoint, status)
}

/// Current page of results, or the inline error of a failed search.
pub fn page(session: &Session) -> String {
    if let Some(error) = session.last_error() {
        return error.to_string();
    }

    let offset = session.paginator().page_index() * session.paginator().page_size();
    let mut lines = vec![session.stats().to_string()];
    if session.window().is_empty() {
        lines.push("No results.".to_string());
    }
    lines.extend(
        session
            .window()
            .iter()
            .enumerate()
            .map(|(i, r)| result(offset + i + 1, r)),
    );
    lines.join("\n")
}

pub fn suggestions(list: &[String]) -> String {
    list.iter()
        .enumerate()
        .map(|(i, s)| format!("  {}) {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SearchResult {
        SearchResult {
            id: "2101.00001".to_string(),
            title: "Graph Neural Networks".to_string(),
            authors: "A. Author".to_string(),
            summary: "We study graphs.".to_string(),
            url: None,
            score: 0.912,
            date: "2021-01-01".to_string(),
            category: String::new(),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("  padded  ", 10), "padded");
    }

    #[test]
    fn test_result_lines() {
        let text = result(3, &sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[3] Graph Neural Networks (0.91)");
        assert_eq!(lines[1], "    A. Author | 2021-01-01");
        assert_eq!(lines[2], "    We study graphs.");
        assert_eq!(lines[3], "    https://arxiv.org/abs/2101.00001");
    }

    #[test]
    fn test_result_without_id_or_url_has_no_link_line() {
        let mut doc = sample();
        doc.id.clear();
        assert_eq!(result(1, &doc).lines().count(), 3);
    }

    #[test]
    fn test_endpoint_marks_reachability() {
        let local = ActiveEndpoint {
            kind: aether_core::EndpointKind::Local,
            base_url: "http://localhost:8000".to_string(),
        };
        assert_eq!(
            endpoint(ServerMode::Auto, &local, HealthStatus::OnlineLocal),
            "[+] mode auto | http://localhost:8000 | online (local)"
        );
        assert!(endpoint(ServerMode::Local, &local, HealthStatus::Offline).starts_with("[-]"));
    }

    #[test]
    fn test_suggestions_are_numbered_from_one() {
        let list = vec!["neural".to_string(), "neuron".to_string()];
        assert_eq!(suggestions(&list), "  1) neural\n  2) neuron");
    }
}
