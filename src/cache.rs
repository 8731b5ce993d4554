use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

use tracing::debug;

use crate::error::{Result, RupError};
use crate::models::Dataset;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Identity of a store on disk: where it is and which version of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceKey {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .map_err(|e| RupError::SourceUnavailable(format!("{}: {e}", path.display())))?;
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct Entry {
    loaded_at: Instant,
    dataset: Rc<Dataset>,
}

/// Memoizes enriched datasets per store version for a bounded time.
///
/// Owned by whoever drives a session; the loader itself keeps no state.
pub struct LoadCache {
    ttl: Duration,
    entries: HashMap<SourceKey, Entry>,
    loads: usize,
}

impl Default for LoadCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl LoadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            loads: 0,
        }
    }

    /// Number of times the loader actually ran.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Rc<Dataset>>
    where
        F: FnOnce(&Path) -> Result<Dataset>,
    {
        self.get_or_load_at(path, Instant::now(), load)
    }

    pub fn get_or_load_at<F>(&mut self, path: &Path, now: Instant, load: F) -> Result<Rc<Dataset>>
    where
        F: FnOnce(&Path) -> Result<Dataset>,
    {
        let key = SourceKey::of(path)?;
        let ttl = self.ttl;
        self.entries
            .retain(|k, e| now.saturating_duration_since(e.loaded_at) < ttl && (k.path != key.path || *k == key));

        if let Some(entry) = self.entries.get(&key) {
            debug!(path = %key.path.display(), "Dataset served from cache");
            return Ok(Rc::clone(&entry.dataset));
        }

        let dataset = Rc::new(load(path)?);
        self.loads += 1;
        debug!(path = %key.path.display(), rows = dataset.len(), "Dataset cached");
        self.entries.insert(
            key,
            Entry {
                loaded_at: now,
                dataset: Rc::clone(&dataset),
            },
        );
        Ok(dataset)
    }
}

#[cfg(test)]
impl LoadCache {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("rup.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn fake_load(rows: usize) -> impl FnOnce(&Path) -> Result<Dataset> {
        move |p: &Path| {
            Ok(Dataset {
                source: p.display().to_string(),
                records: Vec::with_capacity(rows),
                ..Dataset::default()
            })
        }
    }

    #[test]
    fn test_second_call_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = store(&dir, "a\n1\n");
        let mut cache = LoadCache::default();
        let now = Instant::now();
        let first = cache.get_or_load_at(&path, now, fake_load(1)).unwrap();
        let second = cache
            .get_or_load_at(&path, now + Duration::from_secs(60), fake_load(1))
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn test_expired_entry_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = store(&dir, "a\n1\n");
        let mut cache = LoadCache::new(Duration::from_secs(10));
        let now = Instant::now();
        cache.get_or_load_at(&path, now, fake_load(1)).unwrap();
        cache
            .get_or_load_at(&path, now + Duration::from_secs(11), fake_load(1))
            .unwrap();
        assert_eq!(cache.loads(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_store_reloads_and_evicts_old_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = store(&dir, "a\n1\n");
        let mut cache = LoadCache::default();
        let now = Instant::now();
        cache.get_or_load_at(&path, now, fake_load(1)).unwrap();
        store(&dir, "a\n1\n2\n3\n");
        cache.get_or_load_at(&path, now, fake_load(3)).unwrap();
        assert_eq!(cache.loads(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_errors_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = store(&dir, "a\n");
        let mut cache = LoadCache::default();
        let err = cache.get_or_load(&path, |_| Err(RupError::SourceEmpty("boom".into())));
        assert!(err.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.loads(), 0);
    }

    #[test]
    fn test_missing_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = LoadCache::default();
        let err = cache
            .get_or_load(&dir.path().join("missing.db"), fake_load(0))
            .unwrap_err();
        assert!(matches!(err, RupError::SourceUnavailable(_)));
    }
}
