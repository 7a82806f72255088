//! In-process mock of the link-management API.
//!
//! Serves `/api/login` and `/api/links` on an ephemeral localhost port and
//! records every request it sees. Used by the client and controller tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use linkdash_core::models::{LinkPayload, SlugPayload};
use linkdash_core::Link;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

pub use axum::http::Method;

pub const PASSWORD: &str = "secret";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct MockState {
    token: String,
    links: Vec<Link>,
    requests: Vec<RecordedRequest>,
    /// Status every authenticated call answers with once the token is pulled
    rejection: Option<StatusCode>,
}

#[derive(Clone)]
pub struct MockApi {
    pub base_url: String,
    state: Arc<Mutex<MockState>>,
}

/// Unsigned token whose `exp` is `seconds` from now.
pub fn token_expiring_in(seconds: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + seconds;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"admin","exp":{}}}"#, exp));
    format!("{}.{}.sig", header, payload)
}

pub fn fixture_links() -> Vec<Link> {
    vec![
        Link {
            slug: "docs".to_string(),
            url: "https://example.com/docs".to_string(),
            clicks: 12,
        },
        Link {
            slug: "blog".to_string(),
            url: "https://example.com/blog".to_string(),
            clicks: 3,
        },
    ]
}

impl MockApi {
    pub async fn spawn() -> Self {
        Self::spawn_with(fixture_links()).await
    }

    pub async fn spawn_with(links: Vec<Link>) -> Self {
        let state = Arc::new(Mutex::new(MockState {
            token: token_expiring_in(3600),
            links,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/api/login", post(login))
            .route(
                "/api/links",
                axum::routing::get(list_links)
                    .post(create_link)
                    .put(update_link)
                    .delete(delete_link),
            )
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock api");
        let addr = listener.local_addr().expect("mock api addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn token(&self) -> String {
        lock(&self.state).token.clone()
    }

    /// Make every authenticated call answer 401 from now on.
    pub fn revoke(&self) {
        lock(&self.state).rejection = Some(StatusCode::UNAUTHORIZED);
    }

    /// Make every authenticated call answer 403 from now on.
    pub fn forbid(&self) {
        lock(&self.state).rejection = Some(StatusCode::FORBIDDEN);
    }

    pub fn links(&self) -> Vec<Link> {
        lock(&self.state).links.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.state).requests.len()
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record(state: &Shared, method: Method, uri: &Uri, headers: &HeaderMap) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    lock(&state).requests.push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        authorization,
    });
}

fn authorize(state: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    let guard = lock(state);
    let expected = format!("Bearer {}", guard.token);
    let given = headers.get("authorization").and_then(|v| v.to_str().ok());
    if let Some(status) = guard.rejection {
        return Err((status, Json(json!({"error": "Unauthorized"}))).into_response());
    }
    if given != Some(expected.as_str()) {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response());
    }
    Ok(())
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

async fn login(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Response {
    record(&state, method, &uri, &headers);
    if body.password != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Wrong password"}))).into_response();
    }
    let token = lock(&state).token.clone();
    Json(json!({ "token": token })).into_response()
}

async fn list_links(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, method, &uri, &headers);
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let links = lock(&state).links.clone();
    Json(links).into_response()
}

async fn create_link(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<LinkPayload>,
) -> Response {
    record(&state, method, &uri, &headers);
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut guard = lock(&state);
    if guard.links.iter().any(|l| l.slug == body.slug) {
        return (StatusCode::CONFLICT, Json(json!({"error": "Slug already exists"}))).into_response();
    }
    guard.links.push(Link {
        slug: body.slug.clone(),
        url: body.url.clone(),
        clicks: 0,
    });
    (StatusCode::CREATED, Json(json!({"slug": body.slug, "url": body.url}))).into_response()
}

async fn update_link(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<LinkPayload>,
) -> Response {
    record(&state, method, &uri, &headers);
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut guard = lock(&state);
    match guard.links.iter_mut().find(|l| l.slug == body.slug) {
        Some(link) => {
            link.url = body.url;
            Json(json!({"success": true})).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Link not found"}))).into_response(),
    }
}

async fn delete_link(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<SlugPayload>,
) -> Response {
    record(&state, method, &uri, &headers);
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut guard = lock(&state);
    let before = guard.links.len();
    guard.links.retain(|l| l.slug != body.slug);
    if guard.links.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Link not found"}))).into_response();
    }
    Json(json!({"success": true})).into_response()
}
