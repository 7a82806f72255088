//! REST API client module for the link-management service.
//!
//! This module provides the `ApiClient` for logging in and for listing,
//! creating, updating and deleting short links.
//!
//! Authenticated endpoints take a JWT bearer token obtained from
//! `POST /api/login`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
