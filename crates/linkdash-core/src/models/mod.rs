//! Data models for the link-management API.
//!
//! - `Link`: a short link as listed by the API
//! - Request bodies: `LoginRequest`, `LinkPayload`, `SlugPayload`
//! - Response bodies: `LoginResponse`, `ErrorBody`

pub mod link;

pub use link::{short_url, ErrorBody, Link, LinkPayload, LoginRequest, LoginResponse, SlugPayload};
