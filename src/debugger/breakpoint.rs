use crate::runtime::Storage;
use crate::{DebuggerError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// A breakpoint at an instruction address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub address: u32,
    /// Kept in the set but not armed in the engine.
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    /// Removed automatically the first time it is hit.
    #[serde(default, skip_serializing_if = "is_false")]
    pub one_shot: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Breakpoint {
    pub fn new(address: u32) -> Self {
        Self {
            address,
            disabled: false,
            one_shot: false,
        }
    }

    pub fn one_shot(address: u32) -> Self {
        Self {
            one_shot: true,
            ..Self::new(address)
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.address)?;
        match (self.disabled, self.one_shot) {
            (false, false) => Ok(()),
            (true, false) => write!(f, " (disabled)"),
            (false, true) => write!(f, " (one-shot)"),
            (true, true) => write!(f, " (disabled, one-shot)"),
        }
    }
}

/// The persisted breakpoint set of one program.
///
/// At most one breakpoint exists per address. Every mutation is followed by
/// a full snapshot write to storage under the store's key.
pub struct BreakpointStore {
    key: String,
    storage: Box<dyn Storage>,
    breakpoints: HashMap<u32, Breakpoint>,
}

impl BreakpointStore {
    /// Open the store for `key`, restoring whatever storage holds.
    ///
    /// Absent or unreadable data yields an empty store.
    pub fn open(key: impl Into<String>, storage: Box<dyn Storage>) -> Self {
        let key = key.into();
        let breakpoints = Self::restore(&key, storage.as_ref());
        Self {
            key,
            storage,
            breakpoints,
        }
    }

    fn restore(key: &str, storage: &dyn Storage) -> HashMap<u32, Breakpoint> {
        let Some(raw) = storage.get(key) else {
            debug!("No saved breakpoints for {}", key);
            return HashMap::new();
        };
        match serde_json::from_str::<Vec<Breakpoint>>(&raw) {
            Ok(list) => {
                let restored: HashMap<u32, Breakpoint> =
                    list.into_iter().map(|bp| (bp.address, bp)).collect();
                info!("Restored {} breakpoints for {}", restored.len(), key);
                restored
            }
            Err(e) => {
                warn!("Discarding unreadable breakpoints for {}: {}", key, e);
                HashMap::new()
            }
        }
    }

    /// Storage key this store persists under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Insert or overwrite the breakpoint at `bp.address`.
    pub fn add(&mut self, bp: Breakpoint) -> Result<()> {
        debug!("Adding breakpoint {}", bp);
        let previous = self.breakpoints.insert(bp.address, bp);
        self.persist_or_revert(bp.address, previous)
    }

    /// Remove the breakpoint at `address`. Returns whether one existed.
    pub fn remove(&mut self, address: u32) -> Result<bool> {
        let Some(previous) = self.breakpoints.remove(&address) else {
            return Ok(false);
        };
        debug!("Removed breakpoint at {:#010x}", address);
        self.persist_or_revert(address, Some(previous))?;
        Ok(true)
    }

    pub fn get(&self, address: u32) -> Option<Breakpoint> {
        self.breakpoints.get(&address).copied()
    }

    /// Flip the `disabled` flag and return the updated breakpoint.
    ///
    /// Fails with [`DebuggerError::BreakpointNotFound`] without touching
    /// storage when no breakpoint exists at `address`.
    pub fn toggle_enabled(&mut self, address: u32) -> Result<Breakpoint> {
        let bp = self
            .breakpoints
            .get_mut(&address)
            .ok_or(DebuggerError::BreakpointNotFound(address))?;
        let previous = *bp;
        bp.disabled = !bp.disabled;
        let updated = *bp;
        debug!("Toggled breakpoint {}", updated);
        self.persist_or_revert(address, Some(previous))?;
        Ok(updated)
    }

    /// All breakpoints, ordered by address.
    pub fn list(&self) -> Vec<Breakpoint> {
        self.breakpoints
            .values()
            .copied()
            .sorted_by_key(|bp| bp.address)
            .collect()
    }

    /// Addresses of the breakpoints that should be armed in the engine.
    pub fn enabled_addresses(&self) -> Vec<u32> {
        self.breakpoints
            .values()
            .filter(|bp| bp.is_enabled())
            .map(|bp| bp.address)
            .sorted()
            .collect()
    }

    /// Whether an enabled breakpoint sits at `address`.
    pub fn is_armed_at(&self, address: u32) -> bool {
        self.breakpoints
            .get(&address)
            .is_some_and(Breakpoint::is_enabled)
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Write the full current set to storage, replacing prior contents.
    pub fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.list())
            .map_err(|e| DebuggerError::Storage(format!("Failed to encode breakpoints: {}", e)))?;
        self.storage.set(&self.key, &json)
    }

    /// Persist after a single-address edit. On failure the entry at
    /// `address` is restored to `previous`, so memory matches storage.
    fn persist_or_revert(&mut self, address: u32, previous: Option<Breakpoint>) -> Result<()> {
        let Err(e) = self.persist() else {
            return Ok(());
        };
        warn!("Reverting breakpoint {:#010x}: {}", address, e);
        match previous {
            Some(bp) => self.breakpoints.insert(address, bp),
            None => self.breakpoints.remove(&address),
        };
        Err(e)
    }
}

impl fmt::Debug for BreakpointStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakpointStore")
            .field("key", &self.key)
            .field("breakpoints", &self.list())
            .finish()
    }
}
