//! Persisted credentials: bearer token and optional cookie header.
//!
//! Stored as JSON at `~/.config/zephyr/auth.json`. Loading is tolerant: a
//! missing or unreadable file means "no stored credentials", never an error.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Credentials persisted between sessions.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct AuthStore {
    /// Bearer token for the chat endpoint.
    #[serde(default)]
    pub token: Option<String>,
    /// Optional cookie header sent alongside the token.
    #[serde(default)]
    pub cookie: Option<String>,
}

impl AuthStore {
    /// Loads stored credentials, returning an empty store when the file is
    /// missing or malformed.
    pub fn load() -> Self {
        let Ok(path) = Config::auth_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    fn load_from(path: &PathBuf) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persists the store, restricting the file to the owner on unix.
    pub fn save(&self) -> Result<()> {
        let path = Config::auth_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write credentials to {:?}", path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Removes the stored credential file if present.
    pub fn clear() -> Result<()> {
        let path = Config::auth_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove credentials at {:?}", path))?;
        }
        Ok(())
    }

    pub fn has_auth(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_auth_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zephyr_auth_{}_{}.json", label, std::process::id()))
    }

    #[test]
    fn missing_file_loads_empty_store() {
        let store = AuthStore::load_from(&temp_auth_path("missing"));
        assert!(store.token.is_none());
        assert!(store.cookie.is_none());
        assert!(!store.has_auth());
    }

    #[test]
    fn malformed_file_loads_empty_store() {
        let path = temp_auth_path("malformed");
        fs::write(&path, "not json at all").unwrap();
        let store = AuthStore::load_from(&path);
        assert!(!store.has_auth());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn round_trips_token_and_cookie() {
        let path = temp_auth_path("roundtrip");
        let store = AuthStore {
            token: Some("tok-123".to_string()),
            cookie: Some("session=abc".to_string()),
        };
        fs::write(&path, serde_json::to_string(&store).unwrap()).unwrap();

        let loaded = AuthStore::load_from(&path);
        assert!(loaded.has_auth());
        assert_eq!(loaded.token.as_deref(), Some("tok-123"));
        assert_eq!(loaded.cookie.as_deref(), Some("session=abc"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_token_is_not_auth() {
        let store = AuthStore {
            token: Some(String::new()),
            cookie: None,
        };
        assert!(!store.has_auth());
    }
}
