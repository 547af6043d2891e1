//! Persistent storage for the Mistral API key.
//!
//! A single JSON file (`{"api_key": "..."}`) under the platform config
//! directory, e.g. `~/.config/ocr2md/config.json` on Linux. The format is
//! deliberately trivial: one secret, no expiry, no rotation. A failed save
//! is reported to the caller and never retried.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a crash mid-write can never leave a truncated key file behind. On Unix
//! the file is chmod'ed to 0600 before the rename.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of the key file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    api_key: String,
}

/// File-backed store for the API key.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    /// Store at the platform default location
    /// (`<config_dir>/ocr2md/config.json`).
    pub fn default_location() -> Result<Self, OcrError> {
        let dir = dirs::config_dir().ok_or_else(|| {
            OcrError::Internal("Could not determine the user config directory".into())
        })?;
        Ok(Self {
            path: dir.join("ocr2md").join("config.json"),
        })
    }

    /// Store at an explicit path (used by tests and `--key-file`).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored key.
    ///
    /// Returns `Ok(None)` when the file does not exist or the stored key is
    /// empty — an empty key must never reach the API client.
    pub fn load(&self) -> Result<Option<String>, OcrError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(OcrError::KeyStoreRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let creds: StoredCredentials =
            serde_json::from_str(&contents).map_err(|e| OcrError::KeyStoreMalformed {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;

        if creds.api_key.trim().is_empty() {
            debug!("Key file {} holds an empty key", self.path.display());
            return Ok(None);
        }

        debug!("Loaded API key from {}", self.path.display());
        Ok(Some(creds.api_key))
    }

    /// Persist the key, creating parent directories as needed.
    ///
    /// # Errors
    /// [`OcrError::InvalidConfig`] for an empty key;
    /// [`OcrError::KeyStoreWrite`] when the location is unwritable.
    pub fn save(&self, api_key: &str) -> Result<(), OcrError> {
        if api_key.trim().is_empty() {
            return Err(OcrError::InvalidConfig(
                "Refusing to store an empty API key".into(),
            ));
        }

        let write_err = |e: std::io::Error| OcrError::KeyStoreWrite {
            path: self.path.clone(),
            source: e,
        };

        let parent = self.path.parent().ok_or_else(|| {
            OcrError::Internal(format!("Key path '{}' has no parent", self.path.display()))
        })?;
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let json = serde_json::to_string_pretty(&StoredCredentials {
            api_key: api_key.to_string(),
        })
        .map_err(|e| OcrError::Internal(format!("serialise credentials: {e}")))?;

        // Temp file in the same directory so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!("Saved API key to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> KeyStore {
        KeyStore::at_path(dir.path().join("ocr2md").join("config.json"))
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save("sk-test-123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("sk-test-123"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn empty_stored_key_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "  "}"#).unwrap();
        let store = KeyStore::at_path(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn refuses_to_store_empty_key() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.save(""), Err(OcrError::InvalidConfig(_))));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json at all").unwrap();
        let store = KeyStore::at_path(&path);
        assert!(matches!(
            store.load(),
            Err(OcrError::KeyStoreMalformed { .. })
        ));
    }

    #[test]
    fn overwrite_replaces_previous_key() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save("first").unwrap();
        store.save("second").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second"));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save("sk-perm").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
