use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const TOKEN_KEY: &str = "auth_token";

/// Flat key/value store persisted as pretty JSON, standing in for the
/// browser-local storage the service was designed against.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionStore {
    pub entries: BTreeMap<String, String>,
}

impl SessionStore {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// The persisted auth context, passed to whatever needs credentials rather
/// than read from a global.
#[derive(Debug)]
pub struct Session {
    store: SessionStore,
    path: String,
}

impl Session {
    /// Loads the session file; a missing file starts an empty session.
    pub fn open(path: &str) -> Result<Self> {
        let store = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionStore::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            store,
            path: path.to_string(),
        })
    }

    /// Raw token as stored, which may or may not carry the scheme prefix.
    pub fn token(&self) -> Option<&str> {
        self.store.get(TOKEN_KEY)
    }

    /// `Authorization` header value for the stored token, if any.
    pub fn bearer(&self) -> Option<String> {
        self.token().map(normalize_bearer)
    }

    pub fn store_token(&mut self, raw: &str) -> Result<()> {
        tracing::debug!("storing auth token");
        self.store.set(TOKEN_KEY, raw);
        self.save()
    }

    pub fn forget_token(&mut self) -> Result<()> {
        tracing::debug!("dropping auth token");
        self.store.remove(TOKEN_KEY);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = Path::new(&self.path).parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&self.store)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// Prefixes the scheme unless the stored value already carries it, so the
/// header ends up with exactly one `Bearer `.
pub fn normalize_bearer(raw: &str) -> String {
    if raw.starts_with("Bearer ") {
        raw.to_string()
    } else {
        format!("Bearer {raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_token_gains_the_scheme() {
        assert_eq!(normalize_bearer("abc123"), "Bearer abc123");
    }

    #[test]
    fn prefixed_token_is_kept_as_is() {
        assert_eq!(normalize_bearer("Bearer abc123"), "Bearer abc123");
    }

    #[test]
    fn store_round_trips_the_token_key() {
        let mut store = SessionStore::default();
        assert_eq!(store.get(TOKEN_KEY), None);

        store.set(TOKEN_KEY, "tok");
        assert_eq!(store.get(TOKEN_KEY), Some("tok"));

        store.remove(TOKEN_KEY);
        assert_eq!(store.get(TOKEN_KEY), None);
    }
}
