//! Authentication module for the operator session.
//!
//! This module provides:
//! - `token`: expiry decoding for compact JWT bearer tokens
//! - `Session`: the current token plus its decoded expiry, persisted through
//!   a `TokenStore`
//! - `TokenStore`: file, OS keychain or in-memory token persistence
//! - `ExpiryTimer`: a cancellable task that fires when the session expires

pub mod expiry;
pub mod session;
pub mod store;
pub mod token;

pub use expiry::{ExpiryPlan, ExpiryTimer};
pub use session::{Session, SessionData};
pub use store::{open_store, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TokenStoreKind};
pub use token::decode_expiry;
