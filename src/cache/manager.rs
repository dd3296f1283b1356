//! Index Store
//!
//! Owns the cache root and the state needed to share it safely.
//!
//! ## Layout
//! ```text
//! {cache_dir}/
//!   └── {companion name}[-{origin}]/
//!         └── {data version}/
//!               ├── offsets.efo
//!               └── {kind}.efo
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::source::{CompanionId, CompanionSource};
use crate::table::OffsetsTable;

use super::IndexKind;

/// Counters of how cached tables were obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Tables built by scanning a companion
    pub builds: u64,
    /// Tables mapped from the cache
    pub loads: u64,
}

/// Cache of persisted indexes
///
/// ## Concurrency:
/// - `build_locks`: one mutex per cache path; a build-or-load call holds it
///   for its whole duration, so a path is built at most once per process.
///   An entry lives only while some caller holds or waits for it
/// - Counters are atomic
/// - Returned tables are immutable and need no locking
pub struct IndexStore {
    config: Config,

    /// Per-path build/load serialization
    build_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,

    builds: AtomicU64,
    loads: AtomicU64,
}

impl IndexStore {
    /// Open the store, creating the cache root if needed
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir)?;
        tracing::debug!(cache_dir = %config.cache_dir.display(), "Opened index store");

        Ok(Self {
            config,
            build_locks: Mutex::new(HashMap::new()),
            builds: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        })
    }

    /// Store configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory holding every index of one companion version
    pub fn companion_dir(&self, companion: &CompanionId) -> PathBuf {
        self.config
            .cache_dir
            .join(companion.dir_name())
            .join(companion.version.to_string())
    }

    /// Cache path of one index kind for a companion
    pub fn index_path(&self, companion: &CompanionId, kind: &IndexKind) -> PathBuf {
        self.companion_dir(companion).join(kind.file_name())
    }

    /// Create the companion's cache directory
    pub fn prepare_place_on_disk(&self, companion: &CompanionId) -> Result<PathBuf> {
        let dir = self.companion_dir(companion);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Offsets table for `source`: mapped from the cache, or built and cached
    pub fn offsets_table<S: CompanionSource + ?Sized>(&self, source: &S) -> Result<OffsetsTable> {
        let companion = source.identity();
        let path = self.index_path(&companion, &IndexKind::Offsets);

        let lock = self.path_lock(&path);
        let result = {
            let _guard = lock.lock();
            let placed = if path.exists() {
                Ok(())
            } else {
                self.prepare_place_on_disk(&companion).map(|_| ())
            };
            placed.and_then(|()| OffsetsTable::create_if_absent_or_load(source, &path, &self.config))
        };
        self.release_path_lock(&path, lock);
        let table = result?;

        if table.is_mapped() {
            self.loads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.builds.fetch_add(1, Ordering::Relaxed);
        }
        Ok(table)
    }

    /// Map a cached offsets table without ever building it
    pub fn load_offsets_table(&self, companion: &CompanionId) -> Result<OffsetsTable> {
        let path = self.index_path(companion, &IndexKind::Offsets);
        let table = OffsetsTable::load(&path, &self.config.load_options())?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(table)
    }

    /// Remove every cached index of a companion version.
    ///
    /// Returns `false` when nothing was cached.
    pub fn delete_indexes(&self, companion: &CompanionId) -> Result<bool> {
        let dir = self.companion_dir(companion);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(%companion, dir = %dir.display(), "Deleted cached indexes");

        // Drop the name directory once its last version is gone
        if let Some(parent) = dir.parent() {
            let is_empty = fs::read_dir(parent)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if is_empty {
                match fs::remove_dir(parent) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::debug!(dir = %parent.display(), error = %e, "Failed to remove companion directory");
                    }
                }
            }
        }
        Ok(true)
    }

    /// Build/load counters since the store was opened
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            builds: self.builds.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.build_locks.lock();
        Arc::clone(
            locks
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Forget a path's lock once no other caller holds or waits for it
    fn release_path_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.build_locks.lock();
        // Clones are only handed out under `build_locks`, so the count is stable here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(path);
        }
    }
}
