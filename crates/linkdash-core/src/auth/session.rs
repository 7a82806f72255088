use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::store::TokenStore;
use super::token::decode_expiry;

#[derive(Debug, Clone)]
pub struct SessionData {
    pub token: String,
    /// Decoded `exp` claim; `None` if the token carries no readable expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionData {
    pub fn from_token(token: String) -> Self {
        let expires_at = decode_expiry(&token);
        Self { token, expires_at }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// The single operator session, backed by a `TokenStore`.
pub struct Session {
    store: Box<dyn TokenStore>,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        Self { store, data: None }
    }

    /// Restore a previously stored token.
    ///
    /// Returns `Ok(true)` when a token was found. A token whose decoded
    /// expiry has already passed is still loaded; the caller schedules the
    /// expiry and logs out through the usual path.
    pub fn load(&mut self) -> Result<bool> {
        match self.store.load()? {
            Some(token) => {
                let data = SessionData::from_token(token);
                debug!(expires_at = ?data.expires_at, "Stored session found");
                self.data = Some(data);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the session with a freshly issued token and persist it.
    ///
    /// The in-memory session is replaced even if persisting fails.
    pub fn start(&mut self, token: String) -> Result<()> {
        let data = SessionData::from_token(token);
        info!(expires_at = ?data.expires_at, "Session started");
        let saved = self.store.save(&data.token);
        self.data = Some(data);
        saved
    }

    /// Clear session data, in memory and in the store. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        self.store.clear()
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.data.as_ref().and_then(|d| d.expires_at)
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryTokenStore;
    use crate::auth::token::tests::make_token;

    fn token_expiring_in(seconds: i64) -> String {
        let exp = Utc::now().timestamp() + seconds;
        make_token(&format!(r#"{{"exp":{}}}"#, exp))
    }

    #[test]
    fn test_session_data_expiry() {
        let fresh = SessionData::from_token(token_expiring_in(3600));
        assert!(!fresh.is_expired());
        let exp = fresh.expires_at.unwrap();
        assert!(fresh.is_expired_at(exp));
        assert!(!fresh.is_expired_at(exp - chrono::Duration::seconds(1)));

        let stale = SessionData::from_token(token_expiring_in(-10));
        assert!(stale.is_expired());
    }

    #[test]
    fn test_session_data_without_expiry_never_expires() {
        let data = SessionData::from_token("opaque".to_string());
        assert!(data.expires_at.is_none());
        assert!(!data.is_expired());
    }

    #[test]
    fn test_session_load_from_store() {
        let token = token_expiring_in(3600);
        let mut session = Session::new(Box::new(MemoryTokenStore::with_token(&token)));
        assert!(session.load().unwrap());
        assert_eq!(session.token(), Some(token.as_str()));
        assert!(session.is_valid());
    }

    #[test]
    fn test_session_load_empty_store() {
        let mut session = Session::new(Box::new(MemoryTokenStore::default()));
        assert!(!session.load().unwrap());
        assert!(session.token().is_none());
        assert!(!session.is_valid());
    }

    #[test]
    fn test_session_start_persists_and_clear_removes() {
        let mut session = Session::new(Box::new(MemoryTokenStore::default()));
        let token = token_expiring_in(60);
        session.start(token.clone()).unwrap();
        assert_eq!(session.store().load().unwrap().as_deref(), Some(token.as_str()));
        assert!(session.expires_at().is_some());

        session.clear().unwrap();
        assert!(session.token().is_none());
        assert_eq!(session.store().load().unwrap(), None);
        session.clear().unwrap();
    }
}
