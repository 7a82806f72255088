//! API client for the link-management REST API.
//!
//! This module provides the `ApiClient` struct for logging in and for the
//! authenticated link CRUD calls. Every call is a single request/response
//! cycle; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Link, LinkPayload, LoginRequest, LoginResponse, SlugPayload};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/api/login";
const LINKS_PATH: &str = "/api/links";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API client for the link service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: impl Into<Arc<str>>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<Arc<str>>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            body = %ApiError::truncate_body(&body),
            "API request failed"
        );
        Err(ApiError::from_status(status, &body))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        debug!(%method, url = %url, "Sending request");

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::check_response(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(&text)))
        })
    }

    // ===== Authentication =====

    /// Exchange the operator password for a bearer token.
    pub async fn login(&self, password: &str) -> Result<String, ApiError> {
        let response = self
            .send(Method::POST, LOGIN_PATH, Some(&LoginRequest { password }))
            .await?;
        let login: LoginResponse = Self::parse(response).await?;

        if login.token.is_empty() {
            return Err(ApiError::InvalidResponse("login returned an empty token".into()));
        }
        Ok(login.token)
    }

    // ===== Links =====

    /// Fetch every link, in server order.
    pub async fn list_links(&self) -> Result<Vec<Link>, ApiError> {
        let response = self.send::<()>(Method::GET, LINKS_PATH, None).await?;
        let links: Vec<Link> = Self::parse(response).await?;
        debug!(count = links.len(), "Fetched links");
        Ok(links)
    }

    pub async fn create_link(&self, slug: &str, url: &str) -> Result<(), ApiError> {
        let payload = LinkPayload {
            slug: slug.to_string(),
            url: url.to_string(),
        };
        self.send(Method::POST, LINKS_PATH, Some(&payload)).await?;
        Ok(())
    }

    pub async fn update_link(&self, slug: &str, url: &str) -> Result<(), ApiError> {
        let payload = LinkPayload {
            slug: slug.to_string(),
            url: url.to_string(),
        };
        self.send(Method::PUT, LINKS_PATH, Some(&payload)).await?;
        Ok(())
    }

    pub async fn delete_link(&self, slug: &str) -> Result<(), ApiError> {
        let payload = SlugPayload {
            slug: slug.to_string(),
        };
        self.send(Method::DELETE, LINKS_PATH, Some(&payload)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = ApiClient::new("http://localhost:1/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:1");
        assert_eq!(api.url(LINKS_PATH), "http://localhost:1/api/links");
    }

    #[test]
    fn test_auth_headers() {
        let api = ApiClient::new("http://localhost:1", Duration::from_secs(1)).unwrap();
        assert!(api.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());

        let api = api.with_token("abc.def.ghi");
        let headers = api.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc.def.ghi");
    }

    #[test]
    fn test_clear_token() {
        let mut api = ApiClient::new("http://localhost:1", Duration::from_secs(1)).unwrap();
        api.set_token("t");
        assert!(api.has_token());
        api.clear_token();
        assert!(!api.has_token());
    }
}
