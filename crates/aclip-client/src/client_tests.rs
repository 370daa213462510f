//! Tests for API client functionality.

use std::time::Duration;

use serial_test::serial;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::ApiClient;
use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::ClientError;

// =============================================================================
// Test Helpers
// =============================================================================

fn client_for(server: &MockServer) -> ApiClient {
    let config = ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
    };
    ApiClient::new(config).unwrap()
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_404() {
    let err = ClientError::from_http_status(404, "missing");
    assert!(matches!(err, ClientError::NotFound(_)));
    assert!(!err.is_transient());
}

#[test]
fn test_error_from_http_status_503() {
    let err = ClientError::from_http_status(503, "unavailable");
    assert!(matches!(err, ClientError::ServerError(503, _)));
    assert!(err.is_transient());
    assert_eq!(err.http_status(), Some(503));
}

#[test]
fn test_error_from_http_status_429() {
    let err = ClientError::from_http_status(429, "slow down");
    assert!(matches!(err, ClientError::RequestFailed(429, _)));
    assert!(err.is_transient());
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.timeout, Duration::from_secs(10));
}

#[test]
fn test_config_normalizes_trailing_slash() {
    let config = ClientConfig::default().with_base_url("http://api.local:9000/");
    assert_eq!(config.parsed_base_url().unwrap(), "http://api.local:9000");
}

#[test]
fn test_config_rejects_bad_urls() {
    let config = ClientConfig::default().with_base_url("not a url");
    assert!(matches!(config.parsed_base_url(), Err(ClientError::InvalidConfig(_))));

    let config = ClientConfig::default().with_base_url("ftp://files.local");
    assert!(matches!(config.parsed_base_url(), Err(ClientError::InvalidConfig(_))));
}

#[test]
#[serial]
fn test_config_from_env() {
    std::env::set_var("ACLIP_API_URL", "http://backend:8000");
    std::env::set_var("ACLIP_HTTP_TIMEOUT_SECS", "3");
    std::env::set_var("ACLIP_HTTP_CONNECT_TIMEOUT_SECS", "not-a-number");
    let config = ClientConfig::from_env();
    assert_eq!(config.base_url, "http://backend:8000");
    assert_eq!(config.timeout, Duration::from_secs(3));
    assert_eq!(config.connect_timeout, Duration::from_secs(5));

    std::env::remove_var("ACLIP_API_URL");
    std::env::remove_var("ACLIP_HTTP_TIMEOUT_SECS");
    std::env::remove_var("ACLIP_HTTP_CONNECT_TIMEOUT_SECS");
}

// =============================================================================
// HTTP Tests
// =============================================================================

#[tokio::test]
async fn test_get_project_parses_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "p1",
            "name": "demo",
            "status": "downloading",
            "processing_config": {"download_progress": 55, "download_message": "正在下载视频"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server).get_project("p1").await.unwrap();
    assert_eq!(record.status.as_deref(), Some("downloading"));
    assert_eq!(record.download_snapshot().percent, 55.0);
}

#[tokio::test]
async fn test_get_project_maps_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such project"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_project("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_get_project_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_project("p1").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_snapshot_sends_all_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/simple-progress/snapshot"))
        .and(query_param("project_ids", "p1"))
        .and(query_param("project_ids", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"project_id": "p1", "stage": "SCORING", "percent": 40, "message": "scoring clips"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ids = vec!["p1".to_string(), "p2".to_string()];
    let snapshot = client_for(&server).get_progress_snapshot(&ids).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].stage, "SCORING");
    assert_eq!(snapshot[0].percent, 40);
}

#[tokio::test]
async fn test_snapshot_with_no_ids_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let snapshot = client_for(&server).get_progress_snapshot(&[]).await.unwrap();
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_project_id_is_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/a%2Fb%3Fc%23d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server).get_project("a/b?c#d").await.unwrap();
    assert_eq!(record.status.as_deref(), Some("pending"));
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/autoclip/api/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "processing"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_base_url(format!("{}/autoclip/", server.uri()));
    let record = ApiClient::new(config).unwrap().get_project("p1").await.unwrap();
    assert_eq!(record.status.as_deref(), Some("processing"));
}
