//! Content-addressable store of walking geometries between coordinate pairs.
//!
//! Keys are the SHA-256 of both endpoints rounded to six decimals, in the
//! requested direction. Entries never expire. Storage failures are logged
//! and otherwise ignored: a failed read is a miss, a failed write is a no-op.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::polyline::Polyline;
use crate::traits::{CacheStore, Coordinate};

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub geometry: Polyline,
    /// Unix seconds. Informational only.
    pub created_at: u64,
}

/// Directional cache key for `from -> to`.
pub fn segment_key(from: Coordinate, to: Coordinate) -> String {
    let material = format!(
        "{:.6},{:.6};{:.6},{:.6}",
        key_degrees(from.lon),
        key_degrees(from.lat),
        key_degrees(to.lon),
        key_degrees(to.lat)
    );
    format!("{:x}", Sha256::digest(material.as_bytes()))
}

/// Rounds to six decimals. Adding `0.0` turns `-0.0` into `0.0`.
fn key_degrees(value: f64) -> f64 {
    (value * 1e6).round() / 1e6 + 0.0
}

pub struct SegmentCache {
    store: Box<dyn CacheStore + Send + Sync>,
}

impl std::fmt::Debug for SegmentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentCache").finish_non_exhaustive()
    }
}

impl SegmentCache {
    pub fn new(store: impl CacheStore + Send + Sync + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn on_disk(directory: impl Into<PathBuf>) -> Self {
        Self::new(DiskStore::new(directory))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    /// Geometry stored for exactly `from -> to`.
    pub fn get(&self, from: Coordinate, to: Coordinate) -> Option<Polyline> {
        let key = segment_key(from, to);
        let bytes = match self.store.load(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(%key, error = %err, "segment cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Some(entry.geometry),
            Err(err) => {
                warn!(%key, error = %err, "corrupt segment cache entry, treating as miss");
                None
            }
        }
    }

    /// Records `geometry` for `from -> to`. Never fails.
    pub fn put(&self, from: Coordinate, to: Coordinate, geometry: &Polyline) {
        let key = segment_key(from, to);
        let entry = CacheEntry {
            origin: from,
            destination: to,
            geometry: geometry.clone(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
        };

        let result = serde_json::to_vec(&entry)
            .map_err(CacheError::from)
            .and_then(|bytes| self.store.store(&key, &bytes));

        match result {
            Ok(()) => debug!(%key, vertices = geometry.len(), "segment cached"),
            Err(err) => warn!(%key, error = %err, "segment cache write failed"),
        }
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl CacheStore for DiskStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;

        // Write then rename so readers never observe a partial record.
        let final_path = self.path_for(key);
        let tmp_path = final_path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(tmp_path, final_path)?;
        Ok(())
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lock().get(key).cloned())
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
