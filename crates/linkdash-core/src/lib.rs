//! Core library for linkdash.
//!
//! This crate holds everything the dashboard front-ends share:
//!
//! - `api`: REST client for the link-management API
//! - `auth`: bearer token decoding, session persistence and expiry scheduling
//! - `models`: wire types for links, login and error payloads
//! - `validate`: local slug and URL checks run before any request
//! - `config`: application configuration with env overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod validate;

pub use api::{ApiClient, ApiError};
pub use auth::{ExpiryTimer, Session, SessionData};
pub use config::Config;
pub use models::Link;
