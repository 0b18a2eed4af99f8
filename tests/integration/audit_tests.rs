//! Integration tests for the auditor
//!
//! These tests use wiremock to create mock HTTP servers and run real
//! reqwest probes through the full scan cycle.

use bookmark_audit::checker::{build_http_client, Auditor, HttpTransport, RetryPolicy};
use bookmark_audit::config::UserAgentConfig;
use bookmark_audit::output::{format_markdown_summary, generate_summary};
use bookmark_audit::storage::{InvalidBookmark, RetryEffect, ScanStatus, SqliteStorage, Storage};
use bookmark_audit::{CheckTarget, ErrorKind};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_millis(500);

/// Creates an auditor with a real HTTP transport and short backoff
fn create_test_auditor() -> Auditor {
    let user_agent = UserAgentConfig {
        name: "TestAudit".to_string(),
        version: "1.0.0".to_string(),
        contact_url: None,
    };
    let client = build_http_client(&user_agent).expect("Failed to build client");
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff: vec![Duration::from_millis(10), Duration::from_millis(20)],
    };
    Auditor::with_policy(HttpTransport::new(client), policy)
}

fn bookmark(id: &str, url: String) -> CheckTarget {
    CheckTarget::new(id, format!("Bookmark {}", id), url)
}

#[tokio::test]
async fn test_alive_bookmark_needs_one_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/alive"))
        .and(header("cache-control", "no-cache"))
        .and(header("pragma", "no-cache"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auditor = create_test_auditor();
    let outcome = auditor
        .retry_one(&bookmark("1", format!("{}/alive", mock_server.uri())), TIMEOUT)
        .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.http_status, Some(200));
    assert_eq!(outcome.error_kind, ErrorKind::None);
    assert_eq!(outcome.attempt_count, 1);
    assert_eq!(outcome.history.len(), 1);
}

#[tokio::test]
async fn test_head_rejected_falls_back_to_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auditor = create_test_auditor();
    let outcome = auditor
        .retry_one(&bookmark("2", format!("{}/no-head", mock_server.uri())), TIMEOUT)
        .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.http_status, Some(200));
    assert_eq!(outcome.attempt_count, 1);
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/new"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auditor = create_test_auditor();
    let outcome = auditor
        .retry_one(&bookmark("3", format!("{}/old", mock_server.uri())), TIMEOUT)
        .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.http_status, Some(200));
}

#[tokio::test]
async fn test_missing_page_is_dead_after_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    // 404 is not one of the statuses that trigger a GET
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let auditor = create_test_auditor();
    let outcome = auditor
        .retry_one(&bookmark("4", format!("{}/gone", mock_server.uri())), TIMEOUT)
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.http_status, Some(404));
    assert_eq!(outcome.error_kind, ErrorKind::Http);
    assert_eq!(outcome.error_message.as_deref(), Some("404 Not Found"));
    assert_eq!(outcome.attempt_count, 3);
    assert_eq!(outcome.history.len(), 3);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let auditor = create_test_auditor();
    let started = Instant::now();
    let outcome = auditor
        .retry_one(
            &bookmark("5", format!("{}/slow", mock_server.uri())),
            Duration::from_millis(100),
        )
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_kind, ErrorKind::Timeout);
    assert_eq!(outcome.error_message.as_deref(), Some("Request timed out"));
    assert_eq!(outcome.attempt_count, 3);
    assert!(outcome.history.iter().all(|a| a.error_kind == Some(ErrorKind::Timeout)));

    // Three deadlines plus backoff, never the full server delay
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    // Bind a port, then free it so nothing listens there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");
    drop(listener);

    let auditor = create_test_auditor();
    let outcome = auditor
        .retry_one(&bookmark("6", format!("http://{}/", addr)), TIMEOUT)
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_kind, ErrorKind::Network);
    assert_eq!(outcome.http_status, None);
    assert_eq!(outcome.attempt_count, 3);
}

#[tokio::test]
async fn test_full_scan_reports_progress_and_dead_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/dead"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let mut targets: Vec<CheckTarget> = (0..10)
        .map(|i| bookmark(&i.to_string(), format!("{}/page{}", base_url, i)))
        .collect();
    targets.push(bookmark("dead", format!("{}/dead", base_url)));
    targets.push(CheckTarget::new("folderish", "Settings", "chrome://settings"));

    let auditor = create_test_auditor();
    let stream = auditor
        .run_check(targets, 4, TIMEOUT)
        .expect("Failed to start scan");

    let mut progress = Vec::new();
    let report = stream
        .finish(|p| progress.push((p.completed, p.total)))
        .await
        .expect("Scan ended without a report");

    assert_eq!(report.total, 11);
    assert_eq!(report.completed, 11);
    assert!(!report.cancelled);

    // One event per settled bookmark, counting up without gaps
    let expected: Vec<_> = (1..=11).map(|n| (n, 11)).collect();
    assert_eq!(progress, expected);

    let dead = report.dead_links();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].0.id, "dead");
    assert_eq!(dead[0].1.error_message.as_deref(), Some("410 Gone"));
    assert_eq!(report.summary_line(), "1 invalid out of 11 scanned.");
}

#[tokio::test]
async fn test_cancel_stops_scan_without_waiting() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let targets: Vec<CheckTarget> = (0..20)
        .map(|i| bookmark(&i.to_string(), format!("{}/p{}", mock_server.uri(), i)))
        .collect();

    let auditor = create_test_auditor();
    let stream = auditor
        .run_check(targets, 3, Duration::from_secs(30))
        .expect("Failed to start scan");

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    assert!(auditor.cancel());

    let report = stream.finish(|_| {}).await.expect("Scan ended without a report");

    assert!(report.cancelled);
    assert_eq!(report.completed, 0);
    assert_eq!(report.unattempted(), 20);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!auditor.is_running());
}

#[tokio::test]
async fn test_retry_updates_stored_scan() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Down for the whole scan, back up afterwards
    Mock::given(method("HEAD"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("audit.db");
    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open storage");

    let flaky = bookmark("10", format!("{}/flaky", base_url));
    let gone = bookmark("11", format!("{}/gone", base_url));

    let auditor = create_test_auditor();
    let scan_id = storage.create_scan("test-hash").expect("Failed to create scan");
    let report = auditor
        .run_check(vec![flaky.clone(), gone.clone()], 2, TIMEOUT)
        .expect("Failed to start scan")
        .finish(|_| {})
        .await
        .expect("Scan ended without a report");

    for (target, outcome) in report.dead_links() {
        storage
            .record_invalid(scan_id, &InvalidBookmark::from_outcome(target, &outcome))
            .expect("Failed to record invalid bookmark");
    }
    storage
        .finish_scan(scan_id, ScanStatus::Completed, report.total as u64)
        .expect("Failed to finish scan");

    let summary = generate_summary(&storage).expect("Failed to build summary");
    assert_eq!(summary.summary_line(), "2 invalid out of 2 scanned.");
    assert_eq!(summary.scan.status, ScanStatus::Completed);

    // The flaky site recovered; a retry drops it from the list
    let outcome = auditor.retry_one(&flaky, TIMEOUT).await;
    assert!(outcome.succeeded);
    let effect = storage
        .apply_retry(scan_id, &flaky, &outcome)
        .expect("Failed to apply retry");
    assert_eq!(effect, RetryEffect::Removed);

    let outcome = auditor.retry_one(&gone, TIMEOUT).await;
    let effect = storage
        .apply_retry(scan_id, &gone, &outcome)
        .expect("Failed to apply retry");
    assert_eq!(effect, RetryEffect::Updated);

    let summary = generate_summary(&storage).expect("Failed to build summary");
    assert_eq!(summary.summary_line(), "1 invalid out of 2 scanned.");
    assert_eq!(summary.invalid[0].bookmark_id, "11");

    let markdown = format_markdown_summary(&summary);
    assert!(markdown.contains("/gone"));
    assert!(!markdown.contains("/flaky"));
}
