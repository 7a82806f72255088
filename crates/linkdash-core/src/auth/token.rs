//! Bearer token claim decoding.
//!
//! Only the `exp` claim is read. The signature is never checked: the expiry
//! is used to log out on time, and the API stays the authority on validity.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<f64>,
}

fn decode_payload(token: &str) -> Option<Vec<u8>> {
    let payload = token.split('.').nth(1)?;
    let payload = payload.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()
}

/// Decode the `exp` claim of a compact JWT (`header.payload.signature`).
///
/// Returns `None` for malformed tokens and for tokens without a positive
/// numeric `exp`; such sessions have no client-side expiry.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let bytes = match decode_payload(token) {
        Some(bytes) => bytes,
        None => {
            debug!("Token payload is not valid base64url");
            return None;
        }
    };

    let claims: Claims = match serde_json::from_slice(&bytes) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Token payload is not a JSON claims object");
            return None;
        }
    };

    let exp = claims.exp.filter(|exp| exp.is_finite() && *exp > 0.0)?;
    DateTime::from_timestamp(exp as i64, 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned test token carrying the given claims JSON.
    pub(crate) fn make_token(claims: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims);
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_decode_expiry_reads_exp() {
        let token = make_token(r#"{"sub":"admin","exp":1700000000}"#);
        let expiry = decode_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_decode_expiry_accepts_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":1700000000}"#);
        let token = format!("{}.{}.sig", header, payload);
        assert_eq!(decode_expiry(&token).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_decode_expiry_fractional_exp() {
        let token = make_token(r#"{"exp":1700000000.75}"#);
        assert_eq!(decode_expiry(&token).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_decode_expiry_missing_or_zero_exp() {
        assert!(decode_expiry(&make_token(r#"{"sub":"admin"}"#)).is_none());
        assert!(decode_expiry(&make_token(r#"{"exp":0}"#)).is_none());
        assert!(decode_expiry(&make_token(r#"{"exp":"soon"}"#)).is_none());
    }

    #[test]
    fn test_decode_expiry_malformed_tokens() {
        assert!(decode_expiry("").is_none());
        assert!(decode_expiry("opaque-token").is_none());
        assert!(decode_expiry("a.!!!.c").is_none());
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"));
        assert!(decode_expiry(&not_json).is_none());
    }
}
