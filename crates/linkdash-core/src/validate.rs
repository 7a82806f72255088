//! Local input checks for slugs and destination URLs.
//!
//! These run before any create or update request. The API re-validates
//! everything and remains the final authority.

use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Slug and URL are required")]
    MissingFields,

    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Slug may only contain letters, digits, _ and -")]
    InvalidSlug,
}

/// True if `url` parses as an absolute URL with scheme `http` or `https`.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// True if `slug` is non-empty and matches `^[a-zA-Z0-9_-]+$`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validate the create form. Inputs are trimmed; returns the trimmed pair.
///
/// Checks run in order: both fields present, URL, then slug.
pub fn validate_new_link<'a>(
    slug: &'a str,
    url: &'a str,
) -> Result<(&'a str, &'a str), ValidationError> {
    let slug = slug.trim();
    let url = url.trim();

    if slug.is_empty() || url.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_url(url) {
        return Err(ValidationError::InvalidUrl);
    }
    if !is_valid_slug(slug) {
        return Err(ValidationError::InvalidSlug);
    }
    Ok((slug, url))
}

/// Validate the edit form's new destination. Returns the trimmed URL.
pub fn validate_url_update(url: &str) -> Result<&str, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !is_valid_url(url) {
        return Err(ValidationError::InvalidUrl);
    }
    Ok(url)
}
