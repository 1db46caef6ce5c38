use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::AppError;

pub const TOKEN_KEY: &str = "ems-token";
pub const ROLE_KEY: &str = "ems-role";
pub const USERNAME_KEY: &str = "ems-username";
pub const LANG_KEY: &str = "ems-lang";

/// Keys that make up a logged-in session. The language preference survives logout.
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, ROLE_KEY, USERNAME_KEY];

/// Key/value persistence for the client session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub fn clear_session(store: &dyn SessionStore) -> Result<(), AppError> {
    for key in SESSION_KEYS {
        store.remove(key)?;
    }
    Ok(())
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON file backed store; every write is flushed to disk.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            HashMap::new()
        };
        debug!("session store opened at {}", path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), AppError> {
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("failed to write session file {}: {}", self.path.display(), e);
            AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}.json",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ))
    }

    #[test]
    fn clear_session_keeps_language() {
        let store = MemoryStore::with_entries([
            (TOKEN_KEY, "t"),
            (ROLE_KEY, "admin"),
            (USERNAME_KEY, "root"),
            (LANG_KEY, "jp"),
        ]);
        clear_session(&store).unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(store.get(ROLE_KEY), None);
        assert_eq!(store.get(USERNAME_KEY), None);
        assert_eq!(store.get(LANG_KEY).as_deref(), Some("jp"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = temp_file("ems-session");
        {
            let store = FileStore::open(&path).unwrap();
            store.set(TOKEN_KEY, "abc").unwrap();
            store.set(LANG_KEY, "en").unwrap();
            store.remove(LANG_KEY).unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("abc"));
        assert_eq!(reopened.get(LANG_KEY), None);
        let _ = fs::remove_file(path);
    }
}
