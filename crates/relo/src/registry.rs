//! The external project registry, seen through a narrow interface.
//!
//! The engine never owns registry storage; it reads and writes entries
//! through [`ProjectRegistry`] so the CLI can hand it the real
//! directory-backed store while tests substitute an in-memory fake.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ReloError;

/// Opaque payload stored under a registry key.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEntry {
    /// Filesystem-backed entry; the payload lives inside this directory.
    Directory(PathBuf),
    /// In-memory metadata document.
    Document(Value),
}

/// Key-to-metadata mapping the engine keeps consistent with the
/// filesystem layout.
pub trait ProjectRegistry: Send + Sync {
    fn exists(&self, key: &str) -> Result<bool, ReloError>;
    fn get(&self, key: &str) -> Result<RegistryEntry, ReloError>;
    /// Inserts `entry` under `key`. Fails if the key is already occupied.
    fn put(&self, key: &str, entry: RegistryEntry) -> Result<(), ReloError>;
    /// Removes `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> Result<(), ReloError>;

    /// Moves the entry stored under `old_key` to `new_key` as one unit.
    /// A successful `put` followed by a failing `delete` still counts as
    /// a failed rename for the caller.
    fn rename(&self, old_key: &str, new_key: &str) -> Result<(), ReloError> {
        let entry = self.get(old_key)?;
        self.put(new_key, entry)?;
        self.delete(old_key)
    }
}

impl<R> ProjectRegistry for Arc<R>
where
    R: ProjectRegistry,
{
    fn exists(&self, key: &str) -> Result<bool, ReloError> {
        (**self).exists(key)
    }

    fn get(&self, key: &str) -> Result<RegistryEntry, ReloError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, entry: RegistryEntry) -> Result<(), ReloError> {
        (**self).put(key, entry)
    }

    fn delete(&self, key: &str) -> Result<(), ReloError> {
        (**self).delete(key)
    }

    fn rename(&self, old_key: &str, new_key: &str) -> Result<(), ReloError> {
        (**self).rename(old_key, new_key)
    }
}

/// Registry rooted at a directory with one subdirectory per key.
///
/// Assumes a single writer: no locking is performed, and concurrent
/// invocations against the same root are unsupported.
pub struct DirectoryRegistry {
    root: PathBuf,
}

impl DirectoryRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory holding the registry entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ProjectRegistry for DirectoryRegistry {
    fn exists(&self, key: &str) -> Result<bool, ReloError> {
        Ok(self.entry_dir(key).is_dir())
    }

    fn get(&self, key: &str) -> Result<RegistryEntry, ReloError> {
        let dir = self.entry_dir(key);
        if dir.is_dir() {
            Ok(RegistryEntry::Directory(dir))
        } else {
            Err(ReloError::KeyNotFound(key.to_string()))
        }
    }

    fn put(&self, key: &str, entry: RegistryEntry) -> Result<(), ReloError> {
        let dest = self.entry_dir(key);
        if dest.exists() {
            return Err(ReloError::Registry(format!(
                "entry {key} already exists"
            )));
        }
        match entry {
            RegistryEntry::Directory(source) => {
                fs::create_dir_all(&self.root)?;
                fs::rename(&source, &dest)?;
                Ok(())
            }
            RegistryEntry::Document(_) => Err(ReloError::Registry(
                "directory registry only stores directory entries".into(),
            )),
        }
    }

    fn delete(&self, key: &str) -> Result<(), ReloError> {
        let dir = self.entry_dir(key);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    // A single directory rename keeps the source intact on failure,
    // which the default get/put/delete sequence cannot guarantee once
    // the payload has been moved.
    fn rename(&self, old_key: &str, new_key: &str) -> Result<(), ReloError> {
        let source = self.entry_dir(old_key);
        let dest = self.entry_dir(new_key);
        if !source.is_dir() {
            return Err(ReloError::KeyNotFound(old_key.to_string()));
        }
        if dest.exists() {
            return Err(ReloError::Registry(format!(
                "entry {new_key} already exists"
            )));
        }
        fs::rename(&source, &dest)
            .map_err(|err| ReloError::Registry(format!("rename {old_key} -> {new_key}: {err}")))
    }
}

/// In-memory registry for tests and dry experiments.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry, replacing any existing value.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.lock().insert(key.into(), value);
    }

    /// Snapshot of the current keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

impl ProjectRegistry for InMemoryRegistry {
    fn exists(&self, key: &str) -> Result<bool, ReloError> {
        Ok(self.entries.lock().contains_key(key))
    }

    fn get(&self, key: &str) -> Result<RegistryEntry, ReloError> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .map(RegistryEntry::Document)
            .ok_or_else(|| ReloError::KeyNotFound(key.to_string()))
    }

    fn put(&self, key: &str, entry: RegistryEntry) -> Result<(), ReloError> {
        let value = match entry {
            RegistryEntry::Document(value) => value,
            RegistryEntry::Directory(path) => {
                return Err(ReloError::Registry(format!(
                    "in-memory registry cannot absorb directory entry {}",
                    path.display()
                )));
            }
        };
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            return Err(ReloError::Registry(format!("entry {key} already exists")));
        }
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ReloError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
