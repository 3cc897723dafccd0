use chrono::{DateTime, Utc};

use crate::error::PersistenceError;
use crate::touchpoint::{TouchpointId, TouchpointRecord};

/// Owner of persisted touchpoint identity and lifetime.
///
/// Implementations serialise their own writes; callers hold snapshots only.
/// Every mutation reports success or failure, and callers must not assume a
/// write happened without an `Ok`.
pub trait TouchpointStore {
    /// Snapshot of every record.
    fn list(&self) -> Result<Vec<TouchpointRecord>, PersistenceError>;

    fn get(&self, id: &TouchpointId) -> Result<Option<TouchpointRecord>, PersistenceError>;

    fn insert(&mut self, record: &TouchpointRecord) -> Result<(), PersistenceError>;

    /// Set `last_contact_at` to `at`. Returns the updated record.
    fn reset(
        &mut self,
        id: &TouchpointId,
        at: DateTime<Utc>,
    ) -> Result<TouchpointRecord, PersistenceError>;

    /// Remove permanently. Returns the removed record.
    fn delete(&mut self, id: &TouchpointId) -> Result<TouchpointRecord, PersistenceError>;
}
