//! End-to-end session tests against mock local and hosted engines.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use aether_core::defaults::SEARCH_FAILED_MESSAGE;
use aether_core::{HealthStatus, ServerMode, UploadOutcome};
use aether_session::{HttpBackend, Session, SessionConfig, SessionPhase};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

fn session(local: &MockServer, cloud: &MockServer, mode: ServerMode) -> Session {
    let config = SessionConfig::new(local.uri(), cloud.uri())
        .with_default_mode(mode)
        .with_probe_timeout(Duration::from_millis(500));
    config.validate().unwrap();
    let backend = Arc::new(HttpBackend::new(&config).unwrap());
    Session::new(&config, backend).0
}

fn results(n: usize) -> serde_json::Value {
    let items: Vec<_> = (0..n)
        .map(|i| serde_json::json!({"id": format!("doc-{}", i), "title": format!("Doc {}", i)}))
        .collect();
    serde_json::json!({"results": items, "time_ms": 40})
}

#[tokio::test]
async fn test_auto_mode_uses_local_when_healthy() {
    let local = healthy_server().await;
    let cloud = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "transformers /date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(45)))
        .expect(1)
        .mount(&local)
        .await;

    let mut session = session(&local, &cloud, ServerMode::Auto);
    session.set_mode(ServerMode::Auto).await;
    assert_eq!(session.health(), HealthStatus::OnlineLocal);

    session.set_sort_by_date(true);
    session.set_free_text("transformers");
    assert!(session.submit().await);

    assert_eq!(session.phase(), SessionPhase::Ready);
    let stats = session.stats();
    assert_eq!(stats.result_count, 45);
    assert_eq!(stats.total_pages, 3);
    assert_eq!(stats.elapsed_ms, Some(40.0));

    assert!(session.next_page());
    assert!(session.next_page());
    assert_eq!(session.window().len(), 5);
    assert!(!session.next_page());
}

#[tokio::test]
async fn test_auto_mode_falls_back_to_cloud_on_probe_timeout() {
    let local = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&local)
        .await;
    let cloud = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(2)))
        .expect(1)
        .mount(&cloud)
        .await;

    let mut session = session(&local, &cloud, ServerMode::Auto);
    session.set_mode(ServerMode::Auto).await;
    assert_eq!(session.endpoint().as_str(), cloud.uri());
    assert_eq!(session.health(), HealthStatus::OnlineCloud);

    session.set_free_text("attention");
    session.submit().await;
    assert_eq!(session.paginator().len(), 2);
}

#[tokio::test]
async fn test_local_mode_offline_still_targets_local() {
    let local = MockServer::start().await;
    let cloud = healthy_server().await;

    let mut session = session(&local, &cloud, ServerMode::Cloud);
    session.set_mode(ServerMode::Local).await;
    assert_eq!(session.endpoint().as_str(), local.uri());
    assert_eq!(session.health(), HealthStatus::Offline);
}

#[tokio::test]
async fn test_failed_search_shows_inline_error() {
    let local = healthy_server().await;
    let cloud = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&local)
        .await;

    let mut session = session(&local, &cloud, ServerMode::Local);
    session.set_free_text("anything");
    session.submit().await;

    assert_eq!(session.phase(), SessionPhase::Failed);
    assert_eq!(session.last_error(), Some(SEARCH_FAILED_MESSAGE));
    assert!(session.window().is_empty());
}

#[tokio::test]
async fn test_upload_file_to_active_endpoint() {
    let local = healthy_server().await;
    let cloud = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Queued"})),
        )
        .expect(1)
        .mount(&local)
        .await;

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "some paper text").unwrap();

    let session = session(&local, &cloud, ServerMode::Local);
    let outcome = session.upload_file(file.path()).await;
    assert_eq!(outcome, UploadOutcome::Accepted("Queued".to_string()));
}
