//! aether: command-line client for an Aether search engine.
//!
//! Talks to a local engine, a hosted one, or whichever is reachable, and
//! offers one-shot commands plus an interactive session with debounced
//! suggestions and paged results.

mod interactive;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use aether_core::ServerMode;
use aether_session::{
    HttpBackend, Session, SessionConfig, SessionPhase, SharedSession, SuggestionStream,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "aether")]
#[command(author, version, about = "Search client for Aether engines")]
#[command(propagate_version = true)]
struct Cli {
    /// Server mode: auto, local or cloud (default: AETHER_SERVER_MODE or local)
    #[arg(short, long, global = true)]
    mode: Option<ServerMode>,

    /// Base URL of the local engine (default: AETHER_LOCAL_URL)
    #[arg(long, global = true)]
    local_url: Option<String>,

    /// Base URL of the hosted engine (default: AETHER_CLOUD_URL)
    #[arg(long, global = true)]
    cloud_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the endpoint and report its health
    Health,

    /// Run one search and print a page of results
    Search {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Sort results by date
        #[arg(short, long)]
        date: bool,

        /// Restrict to a category such as cs.LG
        #[arg(short, long)]
        category: Option<String>,

        /// Page to print, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Show suggestions for the last word of the text
    Suggest {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Upload a document for indexing
    Upload {
        /// File to upload
        file: PathBuf,
    },

    /// Start an interactive session
    Interactive,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "aether=info,aether_session=warn")
///
/// Console logs go to stderr so stdout carries only results.
fn init_logging() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aether=info,aether_session=warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("aether.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

fn load_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = SessionConfig::from_env().context("Invalid environment configuration")?;
    if let Some(url) = &cli.local_url {
        config = config.with_local_url(url.clone());
    }
    if let Some(url) = &cli.cloud_url {
        config = config.with_cloud_url(url.clone());
    }
    if let Some(mode) = cli.mode {
        config = config.with_default_mode(mode);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli)?;
    let backend = Arc::new(HttpBackend::new(&config)?);
    let (mut session, events) = Session::new(&config, backend);

    match cli.command {
        Commands::Health => {
            session.set_mode(config.default_mode).await;
            println!(
                "{}",
                render::endpoint(session.mode(), session.endpoint(), session.health())
            );
            if !session.health().is_online() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Search {
            query,
            date,
            category,
            page,
        } => {
            session.set_mode(config.default_mode).await;
            session.set_sort_by_date(date);
            if let Some(category) = category {
                session.set_category_filter(category);
            }
            session.set_free_text(query.join(" "));
            if !session.submit().await {
                anyhow::bail!("Query is empty");
            }
            session.go_to_page(page.saturating_sub(1));
            println!("{}", render::page(&session));
            if session.phase() == SessionPhase::Failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Suggest { text } => {
            session.set_mode(config.default_mode).await;
            cmd_suggest(&mut session, events, text.join(" "), &config).await;
        }
        Commands::Upload { file } => {
            session.set_mode(config.default_mode).await;
            let outcome = session.upload_file(&file).await;
            println!("{}", outcome.message());
            if !outcome.is_accepted() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Interactive => {
            let shared = SharedSession::new(session);
            let resolving = shared.clone();
            let mode = config.default_mode;
            tokio::spawn(async move { resolving.set_mode(mode).await });
            interactive::run(shared, events).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_suggest(
    session: &mut Session,
    mut events: SuggestionStream,
    text: String,
    config: &SessionConfig,
) {
    // A fresh session has no other text changes, so the first event is ours.
    session.set_free_text(text);
    let wait = config.suggest_debounce + config.request_timeout;
    let event = tokio::time::timeout(wait + Duration::from_secs(1), events.next()).await;

    if let Ok(Some(event)) = event {
        session.apply_suggestion_event(event);
    }
    if session.suggestions().is_empty() {
        println!("No suggestions.");
    } else {
        println!("{}", render::suggestions(session.suggestions()));
    }
}
