//! Persisted chat session credentials.
//!
//! The transport rotates its credentials while connected; each rotation is
//! written atomically so a crash never leaves a half-written file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

const CREDENTIALS_FILE: &str = "creds.json";

/// Credential file inside the auth directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store keeping `creds.json` inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CREDENTIALS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads saved credentials. A missing file is not an error.
    pub fn load(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Replaces the saved credentials.
    pub fn save(&self, credentials: &Value) -> Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(credentials)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "Chat credentials saved");
        Ok(())
    }

    /// Deletes saved credentials, e.g. after a logout.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_and_creates_dir() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("auth"));

        store.save(&json!({"session": 1})).unwrap();
        store.save(&json!({"session": 2, "keys": ["a"]})).unwrap();

        assert_eq!(store.load().unwrap(), Some(json!({"session": 2, "keys": ["a"]})));
        let leftovers = fs::read_dir(dir.path().join("auth")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save(&json!({})).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }
}
