use std::time::Duration;

use linkdash_core::auth::decode_expiry;
use linkdash_core::{ApiClient, ApiError};
use linkdash_mock::{fixture_links, MockApi, PASSWORD};
use reqwest::StatusCode;

fn client(mock: &MockApi) -> ApiClient {
    ApiClient::new(&mock.base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_login_returns_token_with_expiry() {
    let mock = MockApi::spawn().await;
    let token = client(&mock).login(PASSWORD).await.unwrap();

    assert_eq!(token, mock.token());
    let expiry = decode_expiry(&token).unwrap();
    assert!(expiry > chrono::Utc::now());
}

#[tokio::test]
async fn test_login_wrong_password_is_rejected() {
    let mock = MockApi::spawn().await;
    let err = client(&mock).login("nope").await.unwrap_err();
    // A rejected login is an auth failure from the server's point of view
    assert!(err.is_auth_failure());
    assert!(mock.requests()[0].authorization.is_none());
}

#[tokio::test]
async fn test_list_links_sends_bearer_and_keeps_server_order() {
    let mock = MockApi::spawn().await;
    let api = client(&mock).with_token(mock.token());

    let links = api.list_links().await.unwrap();
    assert_eq!(links, fixture_links());

    let request = &mock.requests()[0];
    assert_eq!(request.method, reqwest::Method::GET);
    assert_eq!(request.path, "/api/links");
    assert_eq!(
        request.authorization.as_deref(),
        Some(format!("Bearer {}", mock.token()).as_str())
    );
}

#[tokio::test]
async fn test_list_links_without_token_is_unauthorized() {
    let mock = MockApi::spawn().await;
    let err = client(&mock).list_links().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(StatusCode::UNAUTHORIZED)));
}

#[tokio::test]
async fn test_create_then_list_round_trip() {
    let mock = MockApi::spawn_with(vec![]).await;
    let api = client(&mock).with_token(mock.token());

    api.create_link("promo", "https://example.com").await.unwrap();
    let links = api.list_links().await.unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].slug, "promo");
    assert_eq!(links[0].url, "https://example.com");
    assert_eq!(links[0].clicks, 0);
}

#[tokio::test]
async fn test_create_duplicate_surfaces_server_message() {
    let mock = MockApi::spawn().await;
    let api = client(&mock).with_token(mock.token());

    let err = api.create_link("docs", "https://other.example").await.unwrap_err();
    assert!(!err.is_auth_failure());
    assert_eq!(err.server_message(), Some("Slug already exists"));
}

#[tokio::test]
async fn test_update_link() {
    let mock = MockApi::spawn().await;
    let api = client(&mock).with_token(mock.token());

    api.update_link("blog", "https://new.example/blog").await.unwrap();
    let blog = mock.links().into_iter().find(|l| l.slug == "blog").unwrap();
    assert_eq!(blog.url, "https://new.example/blog");
    assert_eq!(blog.clicks, 3);
}

#[tokio::test]
async fn test_delete_missing_slug_is_application_error() {
    let mock = MockApi::spawn().await;
    let api = client(&mock).with_token(mock.token());

    let err = api.delete_link("ghost").await.unwrap_err();
    match err {
        ApiError::Rejected { status, ref message } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message.as_deref(), Some("Link not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.links(), fixture_links());
}

#[tokio::test]
async fn test_delete_link() {
    let mock = MockApi::spawn().await;
    let api = client(&mock).with_token(mock.token());

    api.delete_link("docs").await.unwrap();
    let slugs: Vec<String> = api.list_links().await.unwrap().into_iter().map(|l| l.slug).collect();
    assert_eq!(slugs, vec!["blog".to_string()]);
}

#[tokio::test]
async fn test_revoked_session_is_auth_failure_for_every_operation() {
    let mock = MockApi::spawn().await;
    let api = client(&mock).with_token(mock.token());
    mock.revoke();

    assert!(api.list_links().await.unwrap_err().is_auth_failure());
    assert!(api.create_link("x", "https://x.io").await.unwrap_err().is_auth_failure());
    assert!(api.update_link("docs", "https://x.io").await.unwrap_err().is_auth_failure());
    assert!(api.delete_link("docs").await.unwrap_err().is_auth_failure());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = api.login(PASSWORD).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
