//! Durable key/value storage for breakpoint sets.
//!
//! The contract is deliberately tiny: `get` never fails (unreadable data is
//! the same as no data) and `set` overwrites the whole value for a key.

use crate::{DebuggerError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage. Clones share the same map, so a test can keep a handle
/// while a store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one raw value.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage that serves a fixed snapshot and rejects every write, standing in
/// for a full disk or a read-only profile.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyStorage {
    snapshot: Option<String>,
}

impl ReadOnlyStorage {
    pub fn new(snapshot: &str) -> Self {
        Self {
            snapshot: Some(snapshot.to_string()),
        }
    }
}

impl Storage for ReadOnlyStorage {
    fn get(&self, _key: &str) -> Option<String> {
        self.snapshot.clone()
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<()> {
        Err(DebuggerError::Storage(format!("Storage is read-only, cannot write {}", key)).into())
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    ///
    /// Bytes outside `[A-Za-z0-9._-]` are percent-encoded as `%XX`. `%` itself
    /// is encoded, so the mapping is injective and a key never escapes the
    /// directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for byte in key.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                    file.push(byte as char)
                }
                _ => file.push_str(&format!("%{:02X}", byte)),
            }
        }
        self.dir.join(format!("{}.json", file))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored breakpoints at {}", path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DebuggerError::Storage(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;
        std::fs::write(&path, value).map_err(|e| {
            DebuggerError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}
