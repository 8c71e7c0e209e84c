//! Debounced autocomplete.
//!
//! Every text change cancels the pending timer and schedules a new one
//! (trailing-edge debounce). When the timer fires, a suggestion fetch for the
//! last token is started as a detached task; its result is emitted on the
//! event stream only if no newer change has happened since. Stale fetches are
//! not aborted, their results are dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use aether_core::defaults::SUGGEST_MIN_CHARS;
use aether_core::{last_token, SearchBackend};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace, warn};

use crate::generation::{SharedGeneration, Ticket};

/// Events produced by the debouncer, consumed by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionEvent {
    /// Text too short for suggestions: the list must be emptied.
    Cleared { ticket: Ticket },
    /// Suggestions for `token`.
    Suggestions {
        ticket: Ticket,
        token: String,
        suggestions: Vec<String>,
    },
}

impl SuggestionEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Cleared { ticket } | Self::Suggestions { ticket, .. } => *ticket,
        }
    }
}

/// Lazy, cancellable sequence of suggestion events.
pub type SuggestionStream = UnboundedReceiverStream<SuggestionEvent>;

/// Trailing-edge debouncer for suggestion requests.
///
/// Must be driven from inside a tokio runtime: scheduling spawns tasks.
pub struct SuggestionDebouncer {
    backend: Arc<dyn SearchBackend>,
    quiet_period: Duration,
    generation: SharedGeneration,
    pending: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<SuggestionEvent>,
}

impl SuggestionDebouncer {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        quiet_period: Duration,
    ) -> (Self, SuggestionStream) {
        let (events, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            backend,
            quiet_period,
            generation: SharedGeneration::new(),
            pending: None,
            events,
        };
        (debouncer, UnboundedReceiverStream::new(rx))
    }

    /// React to a change of the free text. `endpoint` is the base the fetch
    /// will target. Returns the ticket of the scheduled fetch, or `None`
    /// when the list was cleared instead.
    pub fn on_text_changed(&mut self, free_text: &str, endpoint: &str) -> Option<Ticket> {
        self.cancel_pending();
        let ticket = self.generation.advance();

        let token = last_token(free_text);
        if free_text.chars().count() < SUGGEST_MIN_CHARS || token.is_empty() {
            // The session may already be gone; nothing to clear then.
            let _ = self.events.send(SuggestionEvent::Cleared { ticket });
            return None;
        }

        let token = token.to_string();
        let endpoint = endpoint.to_string();
        let backend = Arc::clone(&self.backend);
        let generation = self.generation.clone();
        let events = self.events.clone();
        let quiet_period = self.quiet_period;

        debug!(
            subsystem = "session",
            component = "suggest",
            generation = ticket.value(),
            token = %token,
            "Suggestion fetch scheduled"
        );

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if !generation.is_current(ticket) {
                return;
            }
            // Detached: the next keystroke cancels the timer, not the fetch.
            tokio::spawn(fetch(backend, endpoint, token, ticket, generation, events));
        }));

        Some(ticket)
    }

    /// Cancel the pending timer and make every in-flight fetch stale.
    pub fn invalidate(&mut self) -> Ticket {
        self.cancel_pending();
        self.generation.advance()
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.is_current(ticket)
    }

    /// True while a timer is waiting for the quiet period to elapse.
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SuggestionDebouncer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn fetch(
    backend: Arc<dyn SearchBackend>,
    endpoint: String,
    token: String,
    ticket: Ticket,
    generation: SharedGeneration,
    events: mpsc::UnboundedSender<SuggestionEvent>,
) {
    match backend.suggest(&endpoint, &token).await {
        Ok(suggestions) => {
            if !generation.is_current(ticket) {
                debug!(
                    subsystem = "session",
                    component = "suggest",
                    generation = ticket.value(),
                    token = %token,
                    "Discarding stale suggestions"
                );
                return;
            }
            trace!(
                subsystem = "session",
                component = "suggest",
                token = %token,
                suggestions = ?suggestions,
                "Suggestions received"
            );
            let _ = events.send(SuggestionEvent::Suggestions {
                ticket,
                token,
                suggestions,
            });
        }
        Err(e) => {
            // The previous list stays displayed.
            warn!(
                subsystem = "session",
                component = "suggest",
                endpoint = %endpoint,
                token = %token,
                error = %e,
                "Suggestion fetch failed"
            );
        }
    }
}

/// Replace the last token of `free_text` with `suggestion`, keeping the
/// preceding tokens, and append a separator for the next word.
pub fn apply_suggestion(free_text: &str, suggestion: &str) -> String {
    let mut words: Vec<&str> = free_text.split_whitespace().collect();
    words.pop();
    words.push(suggestion);
    let mut text = words.join(" ");
    text.push(' ');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use tokio_stream::StreamExt;

    const BASE: &str = "http://local.test";

    fn debouncer(backend: &MockBackend) -> (SuggestionDebouncer, SuggestionStream) {
        SuggestionDebouncer::new(Arc::new(backend.clone()), Duration::from_millis(200))
    }

    #[test]
    fn test_apply_suggestion_replaces_last_token() {
        assert_eq!(apply_suggestion("graph neu", "neural"), "graph neural ");
        assert_eq!(apply_suggestion("neu", "neural"), "neural ");
        assert_eq!(apply_suggestion("  deep   graph neu ", "neural"), "deep graph neural ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_text_clears_without_request() {
        let backend = MockBackend::new();
        let (mut debouncer, mut events) = debouncer(&backend);

        assert!(debouncer.on_text_changed("n", BASE).is_none());
        let event = events.next().await.unwrap();
        assert!(matches!(event, SuggestionEvent::Cleared { .. }));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.call_count("suggest"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_issues_single_request_for_last_token() {
        let backend = MockBackend::new().with_suggestions("neu", ["neural", "neuron"]);
        let (mut debouncer, mut events) = debouncer(&backend);

        debouncer.on_text_changed("graph ne", BASE);
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.on_text_changed("graph neu", BASE);

        let event = events.next().await.unwrap();
        assert_eq!(
            event,
            SuggestionEvent::Suggestions {
                ticket: event.ticket(),
                token: "neu".to_string(),
                suggestions: vec!["neural".to_string(), "neuron".to_string()],
            }
        );
        assert_eq!(backend.call_count("suggest"), 1);
        assert_eq!(backend.calls()[0].input, "neu");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_request_before_quiet_period() {
        let backend = MockBackend::new();
        let (mut debouncer, _events) = debouncer(&backend);

        debouncer.on_text_changed("graph", BASE);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(backend.call_count("suggest"), 0);
        assert!(debouncer.has_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.call_count("suggest"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_emits_nothing() {
        let backend = MockBackend::new().with_failing_suggest();
        let (mut debouncer, mut events) = debouncer(&backend);

        debouncer.on_text_changed("graph", BASE);
        let next = tokio::time::timeout(Duration::from_secs(2), events.next()).await;
        assert!(next.is_err(), "failed fetch must not emit an event");
        assert_eq!(backend.call_count("suggest"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_in_flight_fetch_is_dropped() {
        let backend = MockBackend::new()
            .with_suggest_latency(Duration::from_millis(500))
            .with_suggestions("neu", ["neural"])
            .with_suggestions("neur", ["neuron"]);
        let (mut debouncer, mut events) = debouncer(&backend);

        debouncer.on_text_changed("neu", BASE);
        // Timer fired at 200ms; the first fetch is now in flight.
        tokio::time::sleep(Duration::from_millis(250)).await;
        debouncer.on_text_changed("neur", BASE);

        let event = events.next().await.unwrap();
        match event {
            SuggestionEvent::Suggestions { token, suggestions, .. } => {
                assert_eq!(token, "neur");
                assert_eq!(suggestions, vec!["neuron".to_string()]);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(backend.call_count("suggest"), 2);

        let next = tokio::time::timeout(Duration::from_secs(2), events.next()).await;
        assert!(next.is_err(), "stale result must not be emitted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_cancels_pending_timer() {
        let backend = MockBackend::new();
        let (mut debouncer, _events) = debouncer(&backend);

        debouncer.on_text_changed("graph", BASE);
        debouncer.invalidate();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.call_count("suggest"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_space_clears() {
        let backend = MockBackend::new();
        let (mut debouncer, mut events) = debouncer(&backend);

        assert!(debouncer.on_text_changed("graph ", BASE).is_none());
        assert!(matches!(
            events.next().await,
            Some(SuggestionEvent::Cleared { .. })
        ));
    }
}
