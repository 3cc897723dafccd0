//! In-process store, mainly for tests and previews.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::store::TouchpointStore;
use crate::error::PersistenceError;
use crate::touchpoint::{TouchpointId, TouchpointRecord};

/// A [`TouchpointStore`] backed by a map. Enforces the same unique-channel
/// rule as the SQLite store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<TouchpointId, TouchpointRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = TouchpointRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TouchpointStore for MemoryStore {
    fn list(&self) -> Result<Vec<TouchpointRecord>, PersistenceError> {
        Ok(self.records.values().cloned().collect())
    }

    fn get(&self, id: &TouchpointId) -> Result<Option<TouchpointRecord>, PersistenceError> {
        Ok(self.records.get(id).cloned())
    }

    fn insert(&mut self, record: &TouchpointRecord) -> Result<(), PersistenceError> {
        if self.records.contains_key(&record.id) {
            return Err(PersistenceError::Conflict(format!(
                "duplicate id {}",
                record.id
            )));
        }
        if self.records.values().any(|r| r.channel == record.channel) {
            return Err(PersistenceError::Conflict(format!(
                "duplicate channel {}",
                record.channel
            )));
        }
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn reset(
        &mut self,
        id: &TouchpointId,
        at: DateTime<Utc>,
    ) -> Result<TouchpointRecord, PersistenceError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        record.last_contact_at = at;
        Ok(record.clone())
    }

    fn delete(&mut self, id: &TouchpointId) -> Result<TouchpointRecord, PersistenceError> {
        self.records
            .remove(id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }
}
