use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::warn;

/// Storage keys. Each key maps to one JSON blob file in the store directory.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_DATA: &str = "userData";
    pub const PREVIOUS_USER_DATA: &str = "previousUserData";
    pub const CODE_VERIFIER: &str = "codeVerifier";
    pub const SAVED_RESUME: &str = "savedResume";
    pub const INDUSTRY_INSIGHTS: &str = "industryInsights";
    pub const RESUME_DRAFT: &str = "resumeDraft";
}

/// A directory of opaque JSON blobs, one file per key. Whole-blob reads and
/// writes, last write wins, no versioning.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open() -> Result<Self> {
        let dir = Self::default_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open a store rooted at an explicit directory.
    pub fn at(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn default_dir() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobnest") {
            Ok(proj_dirs.data_dir().to_path_buf())
        } else {
            Ok(PathBuf::from(".jobnest"))
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.blob_path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.blob_path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    /// Read and deserialize a blob. A blob that fails to parse is treated as
    /// absent rather than an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable blob");
                Ok(None)
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).context("Failed to serialize blob")?;
        self.set_raw(key, &raw)
    }

    // --- Credential helpers ---

    pub fn token(&self) -> Option<String> {
        self.get::<String>(keys::TOKEN).ok().flatten()
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.set(keys::TOKEN, &token)
    }

    /// Remove `token` and `userData`, the global 401 handler's job.
    pub fn clear_credentials(&self) -> Result<()> {
        self.remove(keys::TOKEN)?;
        self.remove(keys::USER_DATA)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_roundtrip_blob() {
        let (_dir, store) = temp_store();

        let user = User {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        };
        store.set(keys::USER_DATA, &user).unwrap();

        let loaded: User = store.get(keys::USER_DATA).unwrap().unwrap();
        assert_eq!(loaded.name, "Ada");
        assert_eq!(loaded.email, "ada@example.com");
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_dir, store) = temp_store();
        assert!(store.get_raw("nope").unwrap().is_none());
        assert!(store.get::<User>("nope").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_blob_is_treated_as_absent() {
        let (_dir, store) = temp_store();
        store.set_raw(keys::USER_DATA, "{not json").unwrap();
        assert!(store.get::<User>(keys::USER_DATA).unwrap().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let (_dir, store) = temp_store();
        store.set(keys::TOKEN, &"first").unwrap();
        store.set(keys::TOKEN, &"second").unwrap();
        assert_eq!(store.token().as_deref(), Some("second"));
    }

    #[test]
    fn test_clear_credentials() {
        let (_dir, store) = temp_store();
        store.set_token("abc123").unwrap();
        store.set(keys::USER_DATA, &User::default()).unwrap();

        store.clear_credentials().unwrap();

        assert!(store.token().is_none());
        assert!(store.get::<User>(keys::USER_DATA).unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, store) = temp_store();
        store.remove(keys::CODE_VERIFIER).unwrap();
        store.set(keys::CODE_VERIFIER, &"verifier").unwrap();
        store.remove(keys::CODE_VERIFIER).unwrap();
        store.remove(keys::CODE_VERIFIER).unwrap();
        assert!(store.get_raw(keys::CODE_VERIFIER).unwrap().is_none());
    }
}
