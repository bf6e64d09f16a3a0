//! Session token storage
//!
//! The bearer token lives in a [`SessionStore`] owned by a [`Session`] that
//! is handed to the API client at construction. Two clients built with two
//! sessions never see each other's token.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Default key the token is stored under
pub const DEFAULT_TOKEN_KEY: &str = "smartmarket_token";

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

/// JSON file backed store; every write is flushed to disk before it becomes
/// visible to readers
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
    // serializes writers; readers only wait on `values` for the final swap
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Default location: `<data_local_dir>/smartmarket/session.json`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join("smartmarket");
        Ok(dir.join("session.json"))
    }

    /// Open (or lazily create) the store at `path`. An unreadable or corrupt
    /// file starts an empty session instead of failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("⚠️ Ignoring corrupt session file {:?}: {}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        debug!("Session store opened at {:?} ({} keys)", path, values.len());

        Self {
            path,
            values: RwLock::new(values),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(values).context("Failed to serialize session")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file: {:?}", self.path))?;
        Ok(())
    }

    /// Apply `change` to a copy, write the copy to disk, then swap it in.
    /// A failed write leaves memory untouched. `change` returns `false` when
    /// there is nothing to persist.
    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>) -> bool) -> Result<()> {
        let _writer = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;

        let mut next = self
            .values
            .read()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?
            .clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;

        *self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))? = next;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| values.remove(key).is_some())
    }
}

/// Handle to the token of one client session
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    token_key: String,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>, token_key: impl Into<String>) -> Self {
        Self {
            store,
            token_key: token_key.into(),
        }
    }

    /// Isolated in-memory session
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), DEFAULT_TOKEN_KEY)
    }

    pub fn token(&self) -> Option<String> {
        self.store
            .get(&self.token_key)
            .filter(|token| !token.trim().is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(&self.token_key, token)?;
        info!("🔑 Session token stored");
        Ok(())
    }

    pub fn clear_token(&self) -> Result<()> {
        self.store.remove(&self.token_key)?;
        info!("🔒 Session token cleared");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_key", &self.token_key)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
