//! Persistence for the bearer token.
//!
//! The token is the only piece of client state that survives a restart. It
//! is kept under one fixed key in whichever backend the config selects.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service and entry name
const SERVICE_NAME: &str = "linkdash";
const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown token store: {}", other)),
        }
    }
}

pub trait TokenStore: Send {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn kind(&self) -> TokenStoreKind;
}

/// Open the configured backend. `data_dir` is only used by the file store.
pub fn open_store(kind: TokenStoreKind, data_dir: &Path) -> Box<dyn TokenStore> {
    match kind {
        TokenStoreKind::File => Box::new(FileTokenStore::new(data_dir.to_path_buf())),
        TokenStoreKind::Keyring => Box::new(KeyringTokenStore),
        TokenStoreKind::Memory => Box::new(MemoryTokenStore::default()),
    }
}

// ============================================================================
// File
// ============================================================================

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// Stores `{"token": ...}` in `session.json` under the data directory.
pub struct FileTokenStore {
    data_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let stored: StoredToken =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(stored.token).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let contents = serde_json::to_string_pretty(&StoredToken {
            token: token.to_string(),
        })?;
        std::fs::write(self.session_path(), contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn kind(&self) -> TokenStoreKind {
        TokenStoreKind::File
    }
}

// ============================================================================
// OS keychain
// ============================================================================

pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }

    fn kind(&self) -> TokenStoreKind {
        TokenStoreKind::Keyring
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token lock poisoned"))?
            .clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token lock poisoned"))? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token lock poisoned"))? = None;
        Ok(())
    }

    fn kind(&self) -> TokenStoreKind {
        TokenStoreKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_store_kind_from_str() {
        assert_eq!("file".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::File);
        assert_eq!(" Keyring ".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Keyring);
        assert_eq!("MEMORY".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Memory);
        assert!("redis".parse::<TokenStoreKind>().is_err());
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());
        assert!(store.load().is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.load().unwrap(), None);
        store.save("t").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("t"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(MemoryTokenStore::with_token("x").load().unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_open_store_kind() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [TokenStoreKind::File, TokenStoreKind::Keyring, TokenStoreKind::Memory] {
            assert_eq!(open_store(kind, dir.path()).kind(), kind);
        }
    }
}
