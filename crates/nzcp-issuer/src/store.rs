//! # Issuer Store
//!
//! Persistence behind the issuer cache. The cache logic never touches
//! storage directly; hosts inject an [`IssuerStore`]. Two implementations
//! ship with the crate:
//!
//! - [`InMemoryIssuerStore`]: process-local, for tests and embedding.
//! - [`JsonFileIssuerStore`]: a JSON file rewritten on every mutation, which
//!   also remembers when the last refresh batch completed.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::did::DidDocument;
use crate::error::StoreError;

/// A cached issuer document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedIssuer {
    /// Expiration time, milliseconds since epoch.
    pub ttl: i64,
    /// Resolved issuer document.
    pub value: DidDocument,
    /// When the entry was written, milliseconds since epoch.
    pub updated_timestamp: i64,
}

/// Key-value persistence for cached issuer documents.
///
/// Implementations must be `Send + Sync`: the store is shared between
/// concurrent verifications and the refresh scheduler. Each call must be
/// atomic with respect to its key.
pub trait IssuerStore: Send + Sync {
    fn get_cached_item(&self, key: &str) -> Option<CachedIssuer>;

    fn set_cached_item(&self, key: &str, value: CachedIssuer);

    fn delete_cached_item(&self, key: &str);

    /// Snapshot of every entry.
    fn entries(&self) -> Vec<(String, CachedIssuer)>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryIssuerStore {
    items: RwLock<HashMap<String, CachedIssuer>>,
}

impl InMemoryIssuerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IssuerStore for InMemoryIssuerStore {
    fn get_cached_item(&self, key: &str) -> Option<CachedIssuer> {
        self.items.read().get(key).cloned()
    }

    fn set_cached_item(&self, key: &str, value: CachedIssuer) {
        self.items.write().insert(key.to_string(), value);
    }

    fn delete_cached_item(&self, key: &str) {
        self.items.write().remove(key);
    }

    fn entries(&self) -> Vec<(String, CachedIssuer)> {
        self.items
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// On-disk layout of [`JsonFileIssuerStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    cached_issuers: BTreeMap<String, CachedIssuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_refresh_timestamp: Option<i64>,
}

/// A store persisted as a single JSON file.
///
/// The whole file is rewritten (via a temporary sibling and rename) after
/// every mutation. Write failures are logged and the in-memory state is kept,
/// so a read-only disk degrades to an in-memory cache.
#[derive(Debug)]
pub struct JsonFileIssuerStore {
    path: PathBuf,
    state: RwLock<PersistedState>,
}

impl JsonFileIssuerStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersistedState::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the last completed refresh batch finished, ms since epoch.
    pub fn last_refresh(&self) -> Option<i64> {
        self.state.read().last_refresh_timestamp
    }

    pub fn set_last_refresh(&self, timestamp: i64) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.last_refresh_timestamp = Some(timestamp);
        self.persist(&state)
    }

    fn persist(&self, state: &PersistedState) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(state).map_err(|source| StoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn persist_or_warn(&self, state: &PersistedState) {
        if let Err(e) = self.persist(state) {
            tracing::warn!(path = %self.path.display(), "failed to persist issuer store: {e}");
        }
    }
}

impl IssuerStore for JsonFileIssuerStore {
    fn get_cached_item(&self, key: &str) -> Option<CachedIssuer> {
        self.state.read().cached_issuers.get(key).cloned()
    }

    fn set_cached_item(&self, key: &str, value: CachedIssuer) {
        let mut state = self.state.write();
        state.cached_issuers.insert(key.to_string(), value);
        self.persist_or_warn(&state);
    }

    fn delete_cached_item(&self, key: &str) {
        let mut state = self.state.write();
        if state.cached_issuers.remove(key).is_some() {
            self.persist_or_warn(&state);
        }
    }

    fn entries(&self) -> Vec<(String, CachedIssuer)> {
        self.state
            .read()
            .cached_issuers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
