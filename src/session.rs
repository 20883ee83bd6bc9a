use crate::models::Tier;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const SESSION_FILE: &str = "session.yaml";

/// On-disk shape of a persisted session
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    credential: String,
    tier: Tier,
}

/// Holds the bearer credential and subscription tier across reloads.
///
/// Pure state plus persistence: never issues network calls. An invalid or
/// expired credential is discovered lazily through a 401 from the gateway,
/// not validated here.
pub struct SessionStore {
    credential: Option<String>,
    tier: Tier,
    config_dir: PathBuf,
}

impl SessionStore {
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bindery");
        SessionStore::with_dir(config_dir)
    }

    /// Store rooted at an explicit directory (used by tests)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        SessionStore {
            credential: None,
            tier: Tier::Free,
            config_dir,
        }
    }

    /// Load any persisted credential and tier. Returns true when a session
    /// was restored and the caller should kick off a data refresh.
    pub fn restore(&mut self) -> bool {
        match self.load() {
            Ok(Some(saved)) => {
                self.credential = Some(saved.credential);
                self.tier = saved.tier;
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("failed to read session file: {e}");
                false
            }
        }
    }

    /// Persist a fresh credential after login/registration/external sign-in
    pub fn establish(&mut self, credential: String, tier: Tier) {
        self.credential = Some(credential);
        self.tier = tier;
        self.persist();
    }

    /// Drop the session: on logout or on an authorization failure
    pub fn clear(&mut self) {
        self.credential = None;
        self.tier = Tier::Free;
        let path = self.session_path();
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("failed to remove session file: {e}");
            }
        }
    }

    /// Record a tier change without re-authenticating
    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
        if self.credential.is_some() {
            self.persist();
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    fn session_path(&self) -> PathBuf {
        self.config_dir.join(SESSION_FILE)
    }

    fn load(&self) -> Result<Option<PersistedSession>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_yaml::from_str(&content)?))
    }

    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            tracing::warn!("failed to persist session: {e}");
        }
    }

    fn try_persist(&self) -> Result<()> {
        let Some(credential) = &self.credential else {
            return Ok(());
        };
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)?;
        }
        let saved = PersistedSession {
            credential: credential.clone(),
            tier: self.tier,
        };
        fs::write(self.session_path(), serde_yaml::to_string(&saved)?)?;
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_restore_with_nothing_persisted() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::with_dir(dir.path().to_path_buf());
        assert!(!store.restore());
        assert!(!store.is_authenticated());
        assert_eq!(store.tier(), Tier::Free);
    }

    #[test]
    fn test_establish_then_restore() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::with_dir(dir.path().to_path_buf());
        store.establish("tok-123".into(), Tier::Creator);

        let mut fresh = SessionStore::with_dir(dir.path().to_path_buf());
        assert!(fresh.restore());
        assert_eq!(fresh.credential(), Some("tok-123"));
        assert_eq!(fresh.tier(), Tier::Creator);
    }

    #[test]
    fn test_clear_removes_persisted_state() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::with_dir(dir.path().to_path_buf());
        store.establish("tok-123".into(), Tier::Business);
        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(store.tier(), Tier::Free);

        let mut fresh = SessionStore::with_dir(dir.path().to_path_buf());
        assert!(!fresh.restore());
    }

    #[test]
    fn test_set_tier_persists_without_reauth() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::with_dir(dir.path().to_path_buf());
        store.establish("tok-123".into(), Tier::Free);
        store.set_tier(Tier::Business);

        let mut fresh = SessionStore::with_dir(dir.path().to_path_buf());
        assert!(fresh.restore());
        assert_eq!(fresh.tier(), Tier::Business);
        assert_eq!(fresh.credential(), Some("tok-123"));
    }
}
