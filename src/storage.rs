//! Bearer token storage.
//!
//! The client reads the token from two stores on every request (a persistent
//! one and a session-scoped one) and clears both when the server answers
//! `401`. Writing tokens is left to the login flow.

use std::{
    collections::HashMap,
    fmt, io,
    sync::{Arc, RwLock},
};

/// Default key the token is stored under.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// A key/value store holding the bearer token.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local store; the session-scoped default.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Persistent store backed by a JSON object file.
///
/// The file is created on first write and rewritten on every change. A
/// missing or unreadable file reads as "no token"; writes refuse to replace a
/// file that does not parse, so unrelated keys are never dropped.
///
/// **Not available on `wasm32` targets.**
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileTokenStore {
    path: std::path::PathBuf,
    lock: std::sync::Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileTokenStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: std::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> io::Result<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        std::fs::write(&self.path, content)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|err| err.into_inner());
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %self.path.display(), error = %_err, "failed to read token file");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|err| err.into_inner());
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|err| err.into_inner());
        let mut entries = self.load()?;
        if entries.remove(key).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.save(&entries)
    }
}

/// The pair of stores the client consults, plus the key they share.
#[derive(Clone)]
pub struct TokenStorage {
    persistent: Arc<dyn TokenStore>,
    session: Arc<dyn TokenStore>,
    key: String,
}

impl fmt::Debug for TokenStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Default for TokenStorage {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TokenStorage {
    pub fn new(persistent: Arc<dyn TokenStore>, session: Arc<dyn TokenStore>) -> Self {
        Self {
            persistent,
            session,
            key: DEFAULT_TOKEN_KEY.to_owned(),
        }
    }

    /// Two independent in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryTokenStore::new()),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    /// Uses a different key name in both stores.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn persistent(&self) -> &Arc<dyn TokenStore> {
        &self.persistent
    }

    pub fn session(&self) -> &Arc<dyn TokenStore> {
        &self.session
    }

    /// Returns the first non-blank token, checking the persistent store
    /// before the session store.
    pub fn bearer(&self) -> Option<String> {
        [&self.persistent, &self.session]
            .into_iter()
            .filter_map(|store| store.get(&self.key))
            .map(|token| token.trim().to_owned())
            .find(|token| !token.is_empty())
    }

    /// Removes the token from both stores. Failures are logged and skipped so
    /// that one broken store never keeps the other from being cleared.
    pub fn clear(&self) {
        for store in [&self.persistent, &self.session] {
            if let Err(_err) = store.remove(&self.key) {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = %self.key, error = %_err, "failed to clear stored token");
            }
        }
    }
}
