//! Persistent metric cache.
//!
//! Maps [`CacheKey`] to [`CacheValue`] in memory and persists the whole map
//! as one JSON blob per query. Loading and flushing never fail the run:
//! errors are logged and the cache degrades to in-memory (or empty) state.
//!
//! ## Modes
//!
//! - `Enabled`: load at startup, read/write during the run, flush at the end
//! - `Disabled`: no reads, writes, or persistence; existing blob left alone
//! - `ForceRecalculate`: like `Disabled`, and the existing blob is deleted

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CacheKey, CacheValue};

/// How the cache participates in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Enabled,
    Disabled,
    ForceRecalculate,
}

impl CacheMode {
    /// Resolve the mode from CLI switches. `--no-force-recalculate` wins.
    pub fn from_flags(no_cache: bool, force: bool, no_force: bool) -> Self {
        if force && !no_force {
            CacheMode::ForceRecalculate
        } else if no_cache {
            CacheMode::Disabled
        } else {
            CacheMode::Enabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheMode::Enabled)
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: CacheKey,
    value: CacheValue,
}

#[derive(Serialize, Deserialize, Default)]
struct CacheBlob {
    entries: Vec<CacheEntry>,
}

/// Process-wide metric cache shared by all workers.
#[derive(Debug)]
pub struct MetricCache {
    path: Option<PathBuf>,
    mode: CacheMode,
    entries: RwLock<HashMap<CacheKey, CacheValue>>,
}

impl MetricCache {
    /// Open the cache backed by `path`, loading or discarding the blob
    /// according to `mode`.
    pub fn open(path: impl Into<PathBuf>, mode: CacheMode) -> Self {
        let cache = Self {
            path: Some(path.into()),
            mode,
            entries: RwLock::new(HashMap::new()),
        };

        match mode {
            CacheMode::Enabled => {
                let loaded = cache.load();
                log::info!("Cache: {} entries loaded", loaded);
            }
            CacheMode::ForceRecalculate => {
                log::warn!("Forced recalculation enabled. Cache is not used.");
                cache.discard_blob();
            }
            CacheMode::Disabled => log::info!("Cache disabled for this run"),
        }

        cache
    }

    /// Cache without a backing file.
    pub fn in_memory(mode: CacheMode) -> Self {
        Self {
            path: None,
            mode,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a value. Always absent unless the cache is enabled.
    pub fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        if !self.mode.is_enabled() {
            return None;
        }
        self.read_entries().get(key).copied()
    }

    /// Store a value. No-op unless the cache is enabled.
    pub fn set(&self, key: CacheKey, value: CacheValue) {
        if !self.mode.is_enabled() {
            return;
        }
        self.write_entries().insert(key, value);
    }

    /// Load entries from the blob, replacing the in-memory map.
    ///
    /// Returns the number of entries loaded; any read or decode error
    /// yields an empty cache.
    pub fn load(&self) -> usize {
        if !self.mode.is_enabled() {
            return 0;
        }
        let Some(path) = &self.path else {
            return 0;
        };

        let loaded = match Self::read_blob(path) {
            Ok(Some(blob)) => blob
                .entries
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
            Ok(None) => HashMap::new(),
            Err(e) => {
                log::warn!("Cache load failed from {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        let count = loaded.len();
        *self.write_entries() = loaded;
        count
    }

    /// Persist the current entries. Errors are logged and swallowed.
    ///
    /// Returns `true` when a blob was written.
    pub fn flush(&self) -> bool {
        match self.try_flush() {
            Ok(Some(count)) => {
                log::debug!("Cache: {} entries flushed", count);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::error!("Cache flush failed: {}", e);
                false
            }
        }
    }

    /// Persist the current entries, surfacing errors.
    ///
    /// `Ok(None)` means persistence is off for this cache.
    pub fn try_flush(&self) -> Result<Option<usize>> {
        if !self.mode.is_enabled() {
            return Ok(None);
        }
        let Some(path) = &self.path else {
            return Ok(None);
        };

        let (bytes, count) = {
            let entries = self.read_entries();
            let blob = CacheBlob {
                entries: entries
                    .iter()
                    .map(|(key, value)| CacheEntry {
                        key: key.clone(),
                        value: *value,
                    })
                    .collect(),
            };
            (serde_json::to_vec(&blob)?, entries.len())
        };

        Self::write_atomic(path, &bytes)?;
        Ok(Some(count))
    }

    /// Delete the persisted blob, best effort.
    fn discard_blob(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match fs::remove_file(path) {
            Ok(()) => log::info!("Removed cache file {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove cache file {}: {}", path.display(), e),
        }
    }

    fn read_blob(path: &Path) -> Result<Option<CacheBlob>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write to a sibling temp file, then rename over the blob.
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)
            .map_err(|e| AppError::cache(format!("rename to {}: {}", path.display(), e)))
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CacheValue>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CacheValue>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QualityLabel;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(CacheMode::from_flags(false, false, false), CacheMode::Enabled);
        assert_eq!(CacheMode::from_flags(true, false, false), CacheMode::Disabled);
        assert_eq!(
            CacheMode::from_flags(false, true, false),
            CacheMode::ForceRecalculate
        );
        assert_eq!(CacheMode::from_flags(false, true, true), CacheMode::Enabled);
    }

    #[test]
    fn test_roundtrip_across_runs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache_1.json");

        let cache = MetricCache::open(&path, CacheMode::Enabled);
        cache.set(CacheKey::prose_size("Example"), CacheValue::ProseSize(37));
        cache.set(
            CacheKey::quality("Example"),
            CacheValue::Quality(QualityLabel::Good),
        );
        assert_eq!(
            cache.get(&CacheKey::prose_size("Example")),
            Some(CacheValue::ProseSize(37))
        );
        assert!(cache.flush());

        let reopened = MetricCache::open(&path, CacheMode::Enabled);
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            reopened.get(&CacheKey::quality("Example")),
            Some(CacheValue::Quality(QualityLabel::Good))
        );
    }

    #[test]
    fn test_corrupt_blob_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache_2.json");
        fs::write(&path, b"{not json").unwrap();

        let cache = MetricCache::open(&path, CacheMode::Enabled);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_force_recalculate_discards_and_never_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache_3.json");

        let seeded = MetricCache::open(&path, CacheMode::Enabled);
        seeded.set(CacheKey::prose_size("A"), CacheValue::ProseSize(5));
        assert!(seeded.flush());
        assert!(path.exists());

        let forced = MetricCache::open(&path, CacheMode::ForceRecalculate);
        assert!(!path.exists());
        assert_eq!(forced.get(&CacheKey::prose_size("A")), None);

        forced.set(CacheKey::prose_size("A"), CacheValue::ProseSize(9));
        assert_eq!(forced.get(&CacheKey::prose_size("A")), None);
        assert!(!forced.flush());
        assert!(!path.exists());
    }

    #[test]
    fn test_disabled_leaves_blob_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache_4.json");

        let seeded = MetricCache::open(&path, CacheMode::Enabled);
        seeded.set(CacheKey::prose_size("A"), CacheValue::ProseSize(5));
        seeded.flush();

        let disabled = MetricCache::open(&path, CacheMode::Disabled);
        assert_eq!(disabled.get(&CacheKey::prose_size("A")), None);
        assert!(!disabled.flush());
        assert!(path.exists());
    }

    #[test]
    fn test_flush_error_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        // A directory in place of the blob makes the rename fail.
        let path = tmp.path().join("blob_dir");
        fs::create_dir_all(path.join("inner")).unwrap();

        let cache = MetricCache::open(&path, CacheMode::Enabled);
        cache.set(CacheKey::prose_size("A"), CacheValue::ProseSize(1));
        assert!(!cache.flush());
        assert!(cache.try_flush().is_err());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(MetricCache::in_memory(CacheMode::Enabled));
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let title = format!("T{worker}_{i}");
                        cache.set(CacheKey::prose_size(title), CacheValue::ProseSize(i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
