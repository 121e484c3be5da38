//! Persisted breakpoints.
//!
//! A store maps a local key (see [`Breakpoint::default_key`]) to the
//! breakpoint installed on every new session.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::command::Breakpoint;
use crate::error::{DbgpError, Result};

/// A trait for breakpoint stores shared between sessions.
pub trait BreakpointStore: Clone + Send + 'static {
    /// Save `breakpoint` under `key`, replacing any previous one.
    fn set(&self, key: String, breakpoint: Breakpoint) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<Breakpoint>>;

    /// Remove the breakpoint under `key`.
    fn remove(&self, key: &str) -> Result<()>;

    /// All breakpoints, ordered by key.
    fn list(&self) -> Result<Vec<(String, Breakpoint)>>;
}

/// Breakpoints kept for the lifetime of the process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<String, Breakpoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Breakpoint>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BreakpointStore for MemoryStore {
    fn set(&self, key: String, breakpoint: Breakpoint) -> Result<()> {
        self.lock().insert(key, breakpoint);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Breakpoint>> {
        Ok(self.lock().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(DbgpError::NonExistentBreakpoint(key.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<(String, Breakpoint)>> {
        Ok(self
            .lock()
            .iter()
            .map(|(key, bp)| (key.clone(), bp.clone()))
            .collect())
    }
}

/// Breakpoints in a sled database, one JSON value per key.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("opening breakpoint store at {}", path.display());
        Ok(Self {
            db: sled::open(path)?,
        })
    }
}

impl BreakpointStore for SledStore {
    fn set(&self, key: String, breakpoint: Breakpoint) -> Result<()> {
        let value = serde_json::to_vec(&breakpoint)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Breakpoint>> {
        match self.db.get(key.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.db.remove(key.as_bytes())?.is_none() {
            return Err(DbgpError::NonExistentBreakpoint(key.to_string()));
        }
        self.db.flush()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<(String, Breakpoint)>> {
        self.db
            .iter()
            .map(|entry| {
                let (key, value) = entry?;
                let key = String::from_utf8_lossy(&key).into_owned();
                Ok((key, serde_json::from_slice(&value)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{State, Target};

    fn line(file: &str, line: u32) -> Breakpoint {
        Breakpoint::new(Target::Line {
            file: file.to_string(),
            line,
        })
    }

    #[test]
    fn memory_store_lists_in_key_order() {
        let store = MemoryStore::new();
        let b = line("b.php", 1);
        let a = line("a.php", 9);
        store.set(b.default_key(), b.clone()).unwrap();
        store.set(a.default_key(), a.clone()).unwrap();
        let keys: Vec<String> = store.list().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["line:a.php:10", "line:b.php:2"]);
        assert_eq!(store.get("line:b.php:2").unwrap(), Some(b));
    }

    #[test]
    fn memory_store_remove_missing() {
        let store = MemoryStore::new();
        store.set("k".to_string(), line("a.php", 0)).unwrap();
        store.remove("k").unwrap();
        assert!(matches!(
            store.remove("k"),
            Err(DbgpError::NonExistentBreakpoint(key)) if key == "k"
        ));
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        let mut bp = line("a.php", 3);
        bp.state = State::Disabled;
        other.set("k".to_string(), bp.clone()).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(bp));
    }
}
