use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::entry::Entry;
use crate::error::{Result, StoreError};

/// One directory of cache entries, one JSON file per fingerprint.
///
/// Fingerprints are free-form strings (typically a scheme-stripped URL,
/// possibly suffixed with a body hash) and are not filesystem-safe, so
/// files are named by the hex SHA-256 of the fingerprint.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    root: PathBuf,
}

impl ResponseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the backing directory if needed and return the store.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, fingerprint: &str) -> PathBuf {
        let digest = Sha256::digest(fingerprint.as_bytes());
        self.root.join(format!("{}.json", hex::encode(digest)))
    }

    pub fn exists(&self, fingerprint: &str) -> bool {
        self.path_for(fingerprint).is_file()
    }

    /// Modification time of the backing file.
    pub fn mtime(&self, fingerprint: &str) -> Result<SystemTime> {
        Ok(fs::metadata(self.path_for(fingerprint))?.modified()?)
    }

    pub fn write<T: Serialize>(&self, fingerprint: &str, entry: &Entry<T>) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let encoded = serde_json::to_vec(entry).map_err(StoreError::Serialize)?;
        fs::write(self.path_for(fingerprint), encoded)?;
        Ok(())
    }

    pub fn read<T: DeserializeOwned>(&self, fingerprint: &str) -> Result<Entry<T>> {
        let raw = fs::read(self.path_for(fingerprint))?;
        serde_json::from_slice(&raw).map_err(StoreError::Deserialize)
    }

    /// Remove the backing file. Errors if it does not exist.
    pub fn delete(&self, fingerprint: &str) -> Result<()> {
        let path = self.path_for(fingerprint);
        if !path.is_file() {
            return Err(StoreError::Delete(path));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Fetch a fresh entry, or nothing.
    ///
    /// Absence, staleness and unreadable files all route the caller to a
    /// fresh dispatch, so they collapse to `None` here.
    pub fn lookup<T: DeserializeOwned>(&self, fingerprint: &str) -> Option<Entry<T>> {
        let entry = self.read::<T>(fingerprint).ok()?;
        entry.is_fresh().then_some(entry)
    }

    /// Stamp and persist a payload under the fingerprint.
    pub fn store<T: Serialize>(&self, fingerprint: &str, payload: T, ttl_seconds: u64) -> Result<()> {
        self.write(fingerprint, &Entry::new(fingerprint, payload, ttl_seconds))
    }

    /// Delete the entry for a fingerprint, unconditionally.
    ///
    /// Propagates [`StoreError::Delete`] when there is nothing to delete.
    pub fn clear(&self, fingerprint: &str) -> Result<()> {
        self.delete(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ResponseStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn round_trip_before_ttl_elapses() {
        let (_dir, store) = store();
        store.store("example.com/users", vec![1u8, 2, 3], 60).unwrap();

        let entry = store.lookup::<Vec<u8>>("example.com/users").unwrap();
        assert_eq!(entry.payload, vec![1, 2, 3]);
        assert_eq!(entry.fingerprint, "example.com/users");
        assert_eq!(entry.ttl_seconds, 60);
    }

    #[test]
    fn lookup_misses_on_absent_fingerprint() {
        let (_dir, store) = store();
        assert!(store.lookup::<String>("example.com/none").is_none());
    }

    #[test]
    fn lookup_misses_on_zero_ttl() {
        let (_dir, store) = store();
        store.store("example.com/a", "x".to_string(), 0).unwrap();
        assert!(store.lookup::<String>("example.com/a").is_none());
    }

    #[test]
    fn lookup_misses_on_garbage_file() {
        let (_dir, store) = store();
        fs::write(store.path_for("example.com/a"), b"not json").unwrap();
        assert!(store.lookup::<String>("example.com/a").is_none());
    }

    #[test]
    fn distinct_fingerprints_get_distinct_paths() {
        let (_dir, store) = store();
        let a = store.path_for("example.com/a");
        let b = store.path_for("example.com/a+body=deadbeef");
        assert_ne!(a, b);
    }

    #[test]
    fn clear_removes_entry() {
        let (_dir, store) = store();
        store.store("example.com/a", 1u32, 60).unwrap();
        store.clear("example.com/a").unwrap();
        assert!(!store.exists("example.com/a"));
    }

    #[test]
    fn clear_on_missing_entry_is_an_error() {
        let (_dir, store) = store();
        let err = store.clear("example.com/none").unwrap_err();
        assert!(matches!(err, StoreError::Delete(_)));
    }

    #[test]
    fn mtime_tracks_the_backing_file() {
        let (_dir, store) = store();
        store.store("example.com/a", 1u32, 60).unwrap();
        assert!(store.mtime("example.com/a").is_ok());
        assert!(store.mtime("example.com/none").is_err());
    }
}
