//! Line-oriented interactive session.
//!
//! Plain lines are searched. Lines starting with `?` only edit the query and
//! show suggestions for the last token once typing has paused. Lines
//! starting with `:` are commands (see [`HELP`]).
//!
//! Searches and mode changes run in the background, so a new line can
//! supersede a request that is still in flight.

use std::path::PathBuf;

use aether_core::ServerMode;
use aether_session::{SharedSession, SuggestionStream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing::debug;

use crate::render;

pub const HELP: &str = "\
  <text>        search for text
  ?<text>       edit the query and show suggestions
  :pick N       use suggestion N
  :next :prev   page through results
  :page N       jump to page N
  :date         toggle sort by date
  :cat [CODE]   filter by category (no code clears the filter)
  :mode MODE    switch to auto, local or cloud
  :status       show endpoint and query state
  :upload PATH  upload a document
  :clear        reset query and filters
  :help         show this help
  :quit         leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Edit(String),
    Pick(usize),
    Next,
    Prev,
    Page(usize),
    ToggleDate,
    Category(String),
    Mode(ServerMode),
    Status,
    Upload(PathBuf),
    Clear,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Self::Empty;
        }
        if let Some(text) = line.strip_prefix('?') {
            return Self::Edit(text.to_string());
        }
        let Some(command) = line.trim().strip_prefix(':') else {
            return Self::Search(line.trim().to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match name {
            "pick" => parse_number(arg).map_or_else(Self::Invalid, Self::Pick),
            "next" | "n" => Self::Next,
            "prev" | "p" => Self::Prev,
            "page" => parse_number(arg).map_or_else(Self::Invalid, Self::Page),
            "date" => Self::ToggleDate,
            "cat" => Self::Category(arg.to_string()),
            "mode" => match arg.parse() {
                Ok(mode) => Self::Mode(mode),
                Err(e) => Self::Invalid(e.to_string()),
            },
            "status" => Self::Status,
            "upload" if !arg.is_empty() => Self::Upload(PathBuf::from(arg)),
            "upload" => Self::Invalid("usage: :upload PATH".to_string()),
            "clear" => Self::Clear,
            "help" | "h" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command ':{}', try :help", other)),
        }
    }
}

/// Parse a one-based number.
fn parse_number(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a number from 1, got '{}'", arg)),
    }
}

pub async fn run(session: SharedSession, mut events: SuggestionStream) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = Command::parse(&line);
                if command == Command::Quit {
                    break;
                }
                handle(&session, command).await;
            }
            Some(event) = events.next() => {
                let mut guard = session.lock().await;
                if guard.apply_suggestion_event(event) && !guard.suggestions().is_empty() {
                    println!("{}", render::suggestions(guard.suggestions()));
                }
            }
        }
    }
    Ok(())
}

async fn handle(session: &SharedSession, command: Command) {
    match command {
        Command::Search(text) => {
            let shared = session.clone();
            tokio::spawn(async move {
                if shared.search_text(text).await {
                    println!("{}", render::page(&*shared.lock().await));
                } else {
                    debug!(subsystem = "cli", "Search superseded before it finished");
                }
            });
        }
        Command::Edit(text) => {
            session.lock().await.set_free_text(text);
        }
        Command::Pick(n) => {
            let mut guard = session.lock().await;
            match guard.select_suggestion_at(n - 1) {
                Some(_) => println!("query: {}", guard.query().free_text),
                None => println!("no suggestion {}", n),
            }
        }
        Command::Next | Command::Prev | Command::Page(_) => {
            let mut guard = session.lock().await;
            let moved = match command {
                Command::Next => guard.next_page(),
                Command::Prev => guard.prev_page(),
                Command::Page(n) => {
                    let before = guard.paginator().page_index();
                    guard.go_to_page(n - 1) != before
                }
                _ => false,
            };
            if moved {
                println!("{}", render::page(&guard));
            } else {
                println!("{}", guard.stats());
            }
        }
        Command::ToggleDate => {
            let on = session.lock().await.toggle_sort_by_date();
            println!("sort by date {}", if on { "on" } else { "off" });
        }
        Command::Category(code) => {
            session.lock().await.set_category_filter(code.clone());
            if code.is_empty() {
                println!("category filter cleared");
            } else {
                println!("category filter {}", code);
            }
        }
        Command::Mode(mode) => {
            let shared = session.clone();
            tokio::spawn(async move {
                if shared.set_mode(mode).await {
                    let guard = shared.lock().await;
                    println!("{}", render::endpoint(guard.mode(), guard.endpoint(), guard.health()));
                }
            });
        }
        Command::Status => {
            let guard = session.lock().await;
            println!("{}", render::endpoint(guard.mode(), guard.endpoint(), guard.health()));
            println!("phase {} | query: {}", guard.phase(), guard.composed_query());
        }
        Command::Upload(path) => {
            let outcome = session.upload_file(&path).await;
            println!("{}", outcome.message());
        }
        Command::Clear => {
            session.lock().await.clear();
            println!("query cleared");
        }
        Command::Help => println!("{}", HELP),
        Command::Invalid(message) => println!("{}", message),
        Command::Empty | Command::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_search() {
        assert_eq!(
            Command::parse("graph neural networks\n"),
            Command::Search("graph neural networks".to_string())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_edit_keeps_trailing_space() {
        assert_eq!(Command::parse("?graph "), Command::Edit("graph ".to_string()));
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::parse(":next"), Command::Next);
        assert_eq!(Command::parse(":p"), Command::Prev);
        assert_eq!(Command::parse(":page 3"), Command::Page(3));
        assert_eq!(Command::parse(":pick 1"), Command::Pick(1));
        assert_eq!(Command::parse(":date"), Command::ToggleDate);
        assert_eq!(Command::parse(":cat cs.LG"), Command::Category("cs.LG".to_string()));
        assert_eq!(Command::parse(":cat"), Command::Category(String::new()));
        assert_eq!(Command::parse(":mode Cloud"), Command::Mode(ServerMode::Cloud));
        assert_eq!(
            Command::parse(":upload /tmp/paper.pdf"),
            Command::Upload(PathBuf::from("/tmp/paper.pdf"))
        );
        assert_eq!(Command::parse(":q"), Command::Quit);
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(Command::parse(":page 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":pick x"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":mode space"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":upload"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":frobnicate"), Command::Invalid(_)));
    }

    mod session {
        use super::*;
        use std::sync::Arc;
        use std::time::Duration;

        use aether_core::HealthStatus;
        use aether_session::mock::{sample_results, MockBackend};
        use aether_session::{Session, SessionConfig, SessionPhase};

        const LOCAL: &str = "http://local.test";
        const CLOUD: &str = "https://cloud.test";

        fn shared(backend: &MockBackend) -> (SharedSession, SuggestionStream) {
            let config = SessionConfig::new(LOCAL, CLOUD);
            let (session, events) = Session::new(&config, Arc::new(backend.clone()));
            (SharedSession::new(session), events)
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_line_runs_in_background_then_pages() {
            let backend = MockBackend::new()
                .with_search_results("graph", sample_results(25), 5.0)
                .with_search_latency("graph", Duration::from_millis(50));
            let (session, _events) = shared(&backend);

            handle(&session, Command::parse("graph")).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
            {
                let guard = session.lock().await;
                assert_eq!(guard.phase(), SessionPhase::Ready);
                assert_eq!(guard.paginator().len(), 25);
            }

            handle(&session, Command::Next).await;
            assert_eq!(session.lock().await.paginator().page_index(), 1);
            handle(&session, Command::Page(1)).await;
            assert_eq!(session.lock().await.paginator().page_index(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_newer_search_line_supersedes_slow_one() {
            let backend = MockBackend::new()
                .with_search_results("slow", sample_results(7), 300.0)
                .with_search_latency("slow", Duration::from_millis(300))
                .with_search_results("fast", sample_results(3), 10.0)
                .with_search_latency("fast", Duration::from_millis(10));
            let (session, _events) = shared(&backend);

            handle(&session, Command::parse("slow")).await;
            tokio::time::sleep(Duration::from_millis(5)).await;
            handle(&session, Command::parse("fast")).await;
            tokio::time::sleep(Duration::from_secs(1)).await;

            let guard = session.lock().await;
            assert_eq!(guard.paginator().len(), 3);
            assert_eq!(guard.last_query().map(|q| q.as_str()), Some("fast"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_mode_command_resolves_in_background() {
            let backend = MockBackend::new().with_probe_latency(CLOUD, Duration::from_millis(20));
            let (session, _events) = shared(&backend);

            handle(&session, Command::Mode(ServerMode::Cloud)).await;
            tokio::time::sleep(Duration::from_millis(100)).await;

            let guard = session.lock().await;
            assert_eq!(guard.endpoint().as_str(), CLOUD);
            assert_eq!(guard.health(), HealthStatus::OnlineCloud);
        }

        #[tokio::test(start_paused = true)]
        async fn test_pick_replaces_last_token() {
            let backend = MockBackend::new().with_suggestions("neu", ["neural", "neuron"]);
            let (session, mut events) = shared(&backend);

            handle(&session, Command::parse("?graph neu")).await;
            let event = events.next().await.unwrap();
            assert!(session.lock().await.apply_suggestion_event(event));

            handle(&session, Command::Pick(2)).await;
            let guard = session.lock().await;
            assert_eq!(guard.query().free_text, "graph neuron ");
            assert!(guard.suggestions().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_filter_commands_shape_composed_query() {
            let backend = MockBackend::new();
            let (session, _events) = shared(&backend);

            handle(&session, Command::parse("?transformers")).await;
            handle(&session, Command::ToggleDate).await;
            handle(&session, Command::Category("cs.CL".to_string())).await;
            assert_eq!(
                session.lock().await.composed_query().as_str(),
                "transformers /date /cat:cs.CL"
            );

            handle(&session, Command::Clear).await;
            assert_eq!(session.lock().await.composed_query().as_str(), "");
        }
    }
}
