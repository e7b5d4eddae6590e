//! Filename-keyed image cache.
//!
//! [`ImageStore`] is the persistent tier: one file per key under a root
//! directory, never invalidated. [`TieredCache`] puts an ordered list of
//! [`CacheTier`]s behind a single get/has/put contract so callers do not
//! repeat fallback logic.


use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// One backing tier of a [`TieredCache`].
pub trait CacheTier: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Persistent tiers are only written when the caller asked for persistence.
    fn is_persistent(&self) -> bool;

    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

// ============================================================================
// Disk tier
// ============================================================================

/// Byte-oriented disk cache rooted at a directory.
///
/// Keys are plain filenames (`NGC1300.jpg`, `NGC1300.g.jpg`, `NGC1300.fits`);
/// key formatting is the caller's job.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Opens (creating if needed) a store at `root`.
    ///
    /// Fails with [`Error::Configuration`] when the directory cannot be created
    /// or is not readable and writable.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_error = |reason: String| Error::Configuration {
            path: root.clone(),
            reason,
        };

        fs::create_dir_all(&root).map_err(|e| config_error(format!("cannot create: {}", e)))?;

        let metadata =
            fs::metadata(&root).map_err(|e| config_error(format!("cannot stat: {}", e)))?;
        if !metadata.is_dir() {
            return Err(config_error("not a directory".to_string()));
        }

        fs::read_dir(&root).map_err(|e| config_error(format!("not readable: {}", e)))?;

        // Uniquely named and removed on drop, so concurrent opens cannot collide.
        tempfile::Builder::new()
            .prefix(".bargal-write-check")
            .tempfile_in(&root)
            .map_err(|e| config_error(format!("not writable: {}", e)))?;

        tracing::debug!("Opened image store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under `key`, replacing any previous content.
    ///
    /// The bytes land in a uniquely named hidden sibling first and are
    /// renamed into place, so a reader never sees a partially written entry.
    pub fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(key)?;
        let cache_io = |source: std::io::Error| Error::CacheIo {
            path: path.clone(),
            source,
        };

        let mut partial = tempfile::Builder::new()
            .prefix(&format!(".{}.", key))
            .suffix(".partial")
            .tempfile_in(&self.root)
            .map_err(cache_io)?;
        partial.write_all(bytes).map_err(cache_io)?;
        partial.persist(&path).map_err(|e| cache_io(e.error))?;

        tracing::debug!("Cached {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(key)?;
        fs::read(&path).map_err(|source| Error::CacheIo { path, source })
    }

    pub fn has(&self, key: &str) -> bool {
        self.entry_path(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(Error::InvalidCacheKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl CacheTier for ImageStore {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    fn has(&self, key: &str) -> bool {
        ImageStore::has(self, key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if !ImageStore::has(self, key) {
            return Ok(None);
        }
        self.load(key).map(Some)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.save(key, bytes)
    }
}

// ============================================================================
// Memory tier
// ============================================================================

/// Process-local memo. The first value stored under a key wins.
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheTier for MemoryTier {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries
            .write()
            .entry(key.to_string())
            .or_insert_with(|| bytes.to_vec());
        Ok(())
    }
}

// ============================================================================
// Tiered cache
// ============================================================================

/// Ordered list of cache tiers, consulted front to back.
#[derive(Debug, Default)]
pub struct TieredCache {
    tiers: Vec<Box<dyn CacheTier>>,
}

impl TieredCache {
    /// A cache with no tiers: every lookup misses, every put is dropped.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier(mut self, tier: impl CacheTier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// Memory tier (if enabled) in front of a disk tier (if a directory is given).
    pub fn from_options(dir: Option<&Path>, memory: bool) -> Result<Self> {
        let mut cache = Self::new();
        if memory {
            cache = cache.with_tier(MemoryTier::new());
        }
        if let Some(dir) = dir {
            cache = cache.with_tier(ImageStore::open(dir)?);
        }
        Ok(cache)
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub fn has(&self, key: &str) -> bool {
        self.tiers.iter().any(|t| t.has(key))
    }

    /// Whether a persistent tier holds `key`.
    pub fn is_persisted(&self, key: &str) -> bool {
        self.tiers
            .iter()
            .any(|t| t.is_persistent() && t.has(key))
    }

    /// Returns the first hit. Volatile tiers in front of the hit are back-filled.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            if let Some(bytes) = tier.get(key)? {
                tracing::debug!("Cache hit for {} in {} tier", key, tier.name());
                for front in self.tiers[..index].iter().filter(|t| !t.is_persistent()) {
                    front.put(key, &bytes)?;
                }
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    /// Stores into every volatile tier, and into persistent tiers when `persist` is set.
    pub fn put(&self, key: &str, bytes: &[u8], persist: bool) -> Result<()> {
        for tier in &self.tiers {
            if tier.is_persistent() && !persist {
                continue;
            }
            tier.put(key, bytes)?;
        }
        Ok(())
    }
}
