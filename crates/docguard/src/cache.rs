//! Rule-set caches keyed by signature.
//!
//! Every operation takes `&self` so one cache can be shared by many
//! authorizers and threads. Implementations must make `has`, `get` and `set`
//! atomic per key, and `set` must be last-write-wins. Recomputing a rule set
//! always yields the same value, so a race between two misses only wastes
//! work.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::rules::RuleSet;

/// Storage for normalized rule sets.
pub trait RuleCache: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Arc<RuleSet>>;

    fn set(&self, key: &str, rules: Arc<RuleSet>) -> Result<()>;

    /// Drops every entry.
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// MemoryCache
// ============================================================================

/// Process-local cache. The default when nothing else is injected.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<RuleSet>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-seeded with entries.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, RuleSet)>,
        K: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(key, rules)| (key.into(), Arc::new(rules)))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleCache for MemoryCache {
    fn has(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Arc<RuleSet>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, rules: Arc<RuleSet>) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), rules);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

// ============================================================================
// FileCache
// ============================================================================

/// A cache persisted as a JSON snapshot.
///
/// The snapshot is read once when the cache is opened. Every `set` and
/// `clear` writes the full snapshot to a sibling temp file and renames it
/// into place, so readers of the file never observe a partial write.
/// Processes that open the same path share results computed by earlier runs.
///
/// A snapshot can carry a fingerprint of the declarations it was computed
/// from. [`FileCache::open_with_fingerprint`] discards a snapshot whose
/// fingerprint differs, so edited declarations are never answered from
/// stale rule sets.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    fingerprint: Option<String>,
    entries: RwLock<HashMap<String, Arc<RuleSet>>>,
}

/// On-disk layout, read side.
#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    entries: HashMap<String, RuleSet>,
}

/// On-disk layout, write side.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<&'a str>,
    entries: HashMap<&'a str, &'a RuleSet>,
}

impl FileCache {
    /// Opens (or lazily creates) the snapshot at `path`, keeping whatever it
    /// holds.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = read_snapshot(&path)?;
        debug!(path = %path.display(), entries = snapshot.entries.len(), "Opened rule cache");
        Ok(Self::from_snapshot(path, snapshot))
    }

    /// Opens the snapshot at `path` for declarations identified by
    /// `fingerprint`. A snapshot written for other declarations is dropped
    /// and the file is rewritten empty.
    pub fn open_with_fingerprint(
        path: impl AsRef<Path>,
        fingerprint: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let fingerprint = fingerprint.into();
        let snapshot = read_snapshot(&path)?;

        if snapshot.fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!(path = %path.display(), entries = snapshot.entries.len(), "Opened rule cache");
            let mut cache = Self::from_snapshot(path, snapshot);
            cache.fingerprint = Some(fingerprint);
            return Ok(cache);
        }

        if !snapshot.entries.is_empty() {
            debug!(
                path = %path.display(),
                entries = snapshot.entries.len(),
                "Declarations changed; discarding rule cache"
            );
        }
        let cache = Self {
            path,
            fingerprint: Some(fingerprint),
            entries: RwLock::new(HashMap::new()),
        };
        cache.clear()?;
        Ok(cache)
    }

    /// Replaces whatever is at `path` with an empty snapshot without reading
    /// it, so an unreadable snapshot can still be cleared.
    pub fn reset(path: impl AsRef<Path>) -> Result<Self> {
        let cache = Self {
            path: path.as_ref().to_path_buf(),
            fingerprint: None,
            entries: RwLock::new(HashMap::new()),
        };
        cache.clear()?;
        Ok(cache)
    }

    fn from_snapshot(path: PathBuf, snapshot: Snapshot) -> Self {
        Self {
            path,
            fingerprint: snapshot.fingerprint,
            entries: RwLock::new(
                snapshot
                    .entries
                    .into_iter()
                    .map(|(k, v)| (k, Arc::new(v)))
                    .collect(),
            ),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The declarations fingerprint the snapshot belongs to, if any.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &HashMap<String, Arc<RuleSet>>) -> Result<()> {
        let snapshot = SnapshotRef {
            fingerprint: self.fingerprint.as_deref(),
            entries: entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_ref()))
                .collect(),
        };
        let json =
            serde_json::to_string_pretty(&snapshot).map_err(|e| cache_error(&self.path, &e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| cache_error(&self.path, &e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| cache_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| cache_error(&self.path, &e))
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        return Ok(Snapshot {
            fingerprint: None,
            entries: HashMap::new(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| cache_error(path, &e))?;
    if text.trim().is_empty() {
        return Ok(Snapshot {
            fingerprint: None,
            entries: HashMap::new(),
        });
    }
    serde_json::from_str(&text).map_err(|e| cache_error(path, &e))
}

impl RuleCache for FileCache {
    fn has(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Arc<RuleSet>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, rules: Arc<RuleSet>) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), rules);
        self.persist(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        self.persist(&entries)
    }
}

fn cache_error(path: &Path, err: &dyn std::fmt::Display) -> AuthError {
    AuthError::Cache(format!("{}: {err}", path.display()))
}
