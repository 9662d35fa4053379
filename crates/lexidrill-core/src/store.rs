//! In-memory entry store.
//!
//! Backs tests and the CLI, which loads it from and flushes it to a JSON
//! library file.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::DrillError;
use crate::model::{Entry, EntryId};
use crate::traits::EntryStore;

#[derive(Debug, Default, Clone)]
struct State {
    entries: BTreeMap<EntryId, Entry>,
    next_id: EntryId,
}

impl State {
    fn insert(&mut self, mut entry: Entry) -> Result<Entry, DrillError> {
        let id = match entry.id {
            Some(id) => {
                self.next_id = self.next_id.max(id.saturating_add(1));
                id
            }
            None => {
                let id = self.next_id.max(1);
                // next_id saturates at the top of the range; never hand out a taken id.
                if self.entries.contains_key(&id) {
                    return Err(DrillError::Store("entry ids exhausted".into()));
                }
                self.next_id = id.saturating_add(1);
                id
            }
        };
        entry.id = Some(id);
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }
}

/// Entry store held in memory, ids assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, keeping ids that are already set.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut state = State::default();
        for entry in entries {
            if let Err(e) = state.insert(entry) {
                tracing::warn!(error = %e, "dropping seeded entry");
            }
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of every entry, ordered by id.
    pub fn snapshot(&self) -> Result<Vec<Entry>, DrillError> {
        Ok(self.read()?.entries.values().cloned().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, DrillError> {
        self.state
            .read()
            .map_err(|_| DrillError::Store("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, DrillError> {
        self.state
            .write()
            .map_err(|_| DrillError::Store("store lock poisoned".into()))
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Entry>, DrillError> {
        self.snapshot()
    }

    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>, DrillError> {
        Ok(self.read()?.entries.get(&id).cloned())
    }

    async fn find_by_language(&self, language: &str) -> Result<Vec<Entry>, DrillError> {
        let language = language.trim();
        Ok(self
            .read()?
            .entries
            .values()
            .filter(|e| e.language.eq_ignore_ascii_case(language))
            .cloned()
            .collect())
    }

    async fn save(&self, entry: Entry) -> Result<Entry, DrillError> {
        entry.validate()?;
        self.write()?.insert(entry)
    }

    async fn save_all(&self, entries: Vec<Entry>) -> Result<Vec<Entry>, DrillError> {
        for entry in &entries {
            entry.validate()?;
        }
        let mut state = self.write()?;
        let mut staged = state.clone();
        let saved = entries
            .into_iter()
            .map(|e| staged.insert(e))
            .collect::<Result<Vec<_>, _>>()?;
        *state = staged;
        Ok(saved)
    }

    async fn delete_by_ids(&self, ids: &[EntryId]) -> Result<usize, DrillError> {
        let mut state = self.write()?;
        Ok(ids
            .iter()
            .filter(|id| state.entries.remove(*id).is_some())
            .count())
    }
}
