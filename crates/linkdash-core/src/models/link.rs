use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// A short link as returned by `GET /api/links`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Link {
    pub slug: String,
    pub url: String,
    /// Server-maintained counter, read-only for the client.
    #[serde(default)]
    pub clicks: u64,
}

impl Link {
    pub fn short_url(&self, short_domain: &str) -> String {
        short_url(short_domain, &self.slug)
    }
}

/// Build the public short URL for a slug.
pub fn short_url(short_domain: &str, slug: &str) -> String {
    format!("{}/{}", short_domain.trim_end_matches('/'), slug)
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LoginResponse {
    pub token: String,
}

/// Body for create (`POST`) and update (`PUT`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LinkPayload {
    pub slug: String,
    pub url: String,
}

/// Body for `DELETE /api/links`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SlugPayload {
    pub slug: String,
}

/// Structured failure payload. Anything else in a failure body is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url_joins_domain_and_slug() {
        assert_eq!(
            short_url("https://s.example", "promo"),
            "https://s.example/promo"
        );
        // Trailing slash on the configured domain is ignored
        assert_eq!(
            short_url("https://s.example/", "promo"),
            "https://s.example/promo"
        );
    }

    #[test]
    fn test_link_deserialize_defaults_clicks() {
        let link: Link =
            serde_json::from_str(r#"{"slug":"a","url":"https://x.io"}"#).unwrap();
        assert_eq!(link.clicks, 0);

        let link: Link =
            serde_json::from_str(r#"{"slug":"a","url":"https://x.io","clicks":7}"#).unwrap();
        assert_eq!(link.clicks, 7);
        assert_eq!(link.short_url("https://s.example"), "https://s.example/a");
    }

    #[test]
    fn test_error_body_tolerates_missing_field() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"nope"}"#).unwrap();
        assert!(body.error.is_none());

        let body: ErrorBody = serde_json::from_str(r#"{"error":"Slug exists"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Slug exists"));
    }
}
