//! Touchpoint service: validation, snapshot, and mutation with rollback.
//!
//! The service keeps the last snapshot pulled from its store. Mutations are
//! applied to the snapshot first and undone if the store reports a failure,
//! so the in-memory view never claims a write the store did not accept.
//! Every successful mutation is announced to the refresh listeners.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CoreError, PersistenceError, Result, ValidationError};
use crate::events::{Event, RefreshListener};
use crate::ranking::{rank, RankedTouchpoint};
use crate::storage::TouchpointStore;
use crate::touchpoint::{Category, TouchpointDraft, TouchpointId, TouchpointRecord};

pub struct TouchpointService<S: TouchpointStore> {
    store: S,
    records: Vec<TouchpointRecord>,
    listeners: Vec<Arc<dyn RefreshListener>>,
}

impl<S: TouchpointStore> TouchpointService<S> {
    /// Wrap a store and pull its first snapshot.
    pub fn open(store: S) -> Result<Self> {
        let records = store.list()?;
        debug!(count = records.len(), "loaded touchpoints");
        Ok(Self {
            store,
            records,
            listeners: Vec::new(),
        })
    }

    /// Re-pull the snapshot from the store.
    pub fn refresh(&mut self) -> Result<()> {
        self.records = self.store.list()?;
        Ok(())
    }

    pub fn subscribe(&mut self, listener: Arc<dyn RefreshListener>) {
        self.listeners.push(listener);
    }

    pub fn records(&self) -> &[TouchpointRecord] {
        &self.records
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: &TouchpointId) -> Option<&TouchpointRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Look a record up by full id or by a unique id prefix.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&TouchpointRecord> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(ValidationError::EmptyField { field: "id" }.into());
        }
        if let Some(exact) = self.records.iter().find(|r| r.id.as_str() == needle) {
            return Ok(exact);
        }
        let mut matches = self
            .records
            .iter()
            .filter(|r| r.id.as_str().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => Err(PersistenceError::NotFound(needle.to_string()).into()),
            (Some(_), Some(_)) => Err(ValidationError::InvalidValue {
                field: "id".into(),
                message: format!("'{needle}' matches more than one touchpoint"),
            }
            .into()),
        }
    }

    /// Rank the current snapshot at `now`.
    pub fn ranked<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        category: Option<Category>,
    ) -> Vec<RankedTouchpoint<'_>> {
        rank(&self.records, now, category)
    }

    /// Validate and save a new touchpoint.
    ///
    /// Nothing reaches the store when validation fails.
    pub fn create(&mut self, draft: TouchpointDraft, now: DateTime<Utc>) -> Result<TouchpointRecord> {
        draft.validate()?;
        let channel = draft.channel.trim();
        if self.records.iter().any(|r| r.channel == channel) {
            return Err(ValidationError::DuplicateChannel(channel.to_string()).into());
        }
        let record = draft.into_record(now)?;

        self.records.push(record.clone());
        if let Err(e) = self.store.insert(&record) {
            self.records.pop();
            warn!(id = %record.id, error = %e, "insert failed, rolled back");
            return Err(e.into());
        }

        info!(id = %record.id, name = %record.name, cadence_days = record.cadence_days, "touchpoint created");
        self.notify(&Event::TouchpointCreated {
            id: record.id.clone(),
            name: record.name.clone(),
            at: now,
        });
        Ok(record)
    }

    /// Mark contact as made at `now`.
    pub fn reset(&mut self, id: &TouchpointId, now: DateTime<Utc>) -> Result<TouchpointRecord> {
        let index = self.index_of(id)?;
        let previous = self.records[index].clone();
        self.records[index].last_contact_at = now;

        match self.store.reset(id, now) {
            Ok(updated) => {
                self.records[index] = updated.clone();
                info!(%id, "touchpoint reset");
                self.notify(&Event::TouchpointReset {
                    id: id.clone(),
                    at: now,
                });
                Ok(updated)
            }
            Err(e) => {
                self.records[index] = previous;
                warn!(%id, error = %e, "reset failed, rolled back");
                Err(e.into())
            }
        }
    }

    /// Remove a touchpoint permanently.
    pub fn delete(&mut self, id: &TouchpointId) -> Result<TouchpointRecord> {
        let index = self.index_of(id)?;
        let removed = self.records.remove(index);

        match self.store.delete(id) {
            Ok(record) => {
                info!(%id, "touchpoint deleted");
                self.notify(&Event::TouchpointDeleted {
                    id: id.clone(),
                    at: Utc::now(),
                });
                Ok(record)
            }
            Err(e) => {
                self.records.insert(index, removed);
                warn!(%id, error = %e, "delete failed, rolled back");
                Err(e.into())
            }
        }
    }

    fn index_of(&self, id: &TouchpointId) -> Result<usize> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| CoreError::Persistence(PersistenceError::NotFound(id.to_string())))
    }

    fn notify(&self, event: &Event) {
        for listener in &self.listeners {
            listener.on_refresh_needed(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::touchpoint::PreferredAction;
    use crate::urgency::classify;
    use std::sync::Mutex;

    /// Delegates to a MemoryStore but fails writes on demand.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: bool,
        write_calls: usize,
    }

    impl FlakyStore {
        fn check(&mut self) -> std::result::Result<(), PersistenceError> {
            self.write_calls += 1;
            if self.fail_writes {
                Err(PersistenceError::Locked)
            } else {
                Ok(())
            }
        }
    }

    impl TouchpointStore for FlakyStore {
        fn list(&self) -> std::result::Result<Vec<TouchpointRecord>, PersistenceError> {
            self.inner.list()
        }
        fn get(
            &self,
            id: &TouchpointId,
        ) -> std::result::Result<Option<TouchpointRecord>, PersistenceError> {
            self.inner.get(id)
        }
        fn insert(&mut self, record: &TouchpointRecord) -> std::result::Result<(), PersistenceError> {
            self.check()?;
            self.inner.insert(record)
        }
        fn reset(
            &mut self,
            id: &TouchpointId,
            at: DateTime<Utc>,
        ) -> std::result::Result<TouchpointRecord, PersistenceError> {
            self.check()?;
            self.inner.reset(id, at)
        }
        fn delete(
            &mut self,
            id: &TouchpointId,
        ) -> std::result::Result<TouchpointRecord, PersistenceError> {
            self.check()?;
            self.inner.delete(id)
        }
    }

    fn draft(name: &str, channel: &str, cadence: u32) -> TouchpointDraft {
        TouchpointDraft::new(name, channel, cadence, PreferredAction::Message)
    }

    #[test]
    fn invalid_cadence_never_reaches_store() {
        let mut service = TouchpointService::open(FlakyStore::default()).unwrap();
        for cadence in [0, 400] {
            let err = service
                .create(draft("Jane", "+1", cadence), Utc::now())
                .unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::CadenceOutOfRange { .. })
            ));
        }
        assert_eq!(service.store().write_calls, 0);
        assert!(service.records().is_empty());
    }

    #[test]
    fn duplicate_channel_is_a_validation_error() {
        let mut service = TouchpointService::open(FlakyStore::default()).unwrap();
        service.create(draft("Jane", "+1555", 7), Utc::now()).unwrap();
        let err = service
            .create(draft("Janet", " +1555 ", 7), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateChannel(_))
        ));
        assert_eq!(service.store().write_calls, 1);
    }

    #[test]
    fn failed_insert_rolls_back() {
        let mut service = TouchpointService::open(FlakyStore::default()).unwrap();
        service.store.fail_writes = true;
        let err = service.create(draft("Jane", "+1", 7), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Persistence(PersistenceError::Locked)));
        assert!(service.records().is_empty());
    }

    #[test]
    fn reset_makes_record_maximally_not_due() {
        let mut service = TouchpointService::open(MemoryStore::new()).unwrap();
        let created = Utc::now() - chrono::Duration::days(20);
        let record = service.create(draft("Chris", "+1", 14), created).unwrap();

        let now = Utc::now();
        let updated = service.reset(&record.id, now).unwrap();
        assert_eq!(updated.last_contact_at, now);
        let c = classify(updated.cadence_days, &updated.last_contact_at, &updated.last_contact_at);
        assert_eq!(c.urgency_days, -14);
        assert_eq!(service.get(&record.id).unwrap().last_contact_at, now);
    }

    #[test]
    fn failed_reset_rolls_back() {
        let mut service = TouchpointService::open(FlakyStore::default()).unwrap();
        let created = Utc::now() - chrono::Duration::days(3);
        let record = service.create(draft("Chris", "+1", 14), created).unwrap();

        service.store.fail_writes = true;
        assert!(service.reset(&record.id, Utc::now()).is_err());
        assert_eq!(service.get(&record.id).unwrap().last_contact_at, created);
    }

    #[test]
    fn failed_delete_restores_position() {
        let mut service = TouchpointService::open(FlakyStore::default()).unwrap();
        let now = Utc::now();
        let a = service.create(draft("A", "1", 7), now).unwrap();
        let b = service.create(draft("B", "2", 7), now).unwrap();
        let c = service.create(draft("C", "3", 7), now).unwrap();

        service.store.fail_writes = true;
        assert!(service.delete(&b.id).is_err());
        let ids: Vec<_> = service.records().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut service = TouchpointService::open(MemoryStore::new()).unwrap();
        let err = service.reset(&TouchpointId::from("nope"), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Persistence(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn mutations_notify_listeners() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut service = TouchpointService::open(MemoryStore::new()).unwrap();
        service.subscribe(Arc::new(move |e: &Event| {
            sink.lock().unwrap().push(e.clone());
        }));

        let record = service.create(draft("A", "1", 7), Utc::now()).unwrap();
        service.reset(&record.id, Utc::now()).unwrap();
        service.delete(&record.id).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], Event::TouchpointCreated { .. }));
        assert!(matches!(seen[1], Event::TouchpointReset { .. }));
        assert!(matches!(seen[2], Event::TouchpointDeleted { .. }));
    }

    #[test]
    fn resolve_accepts_unique_prefix() {
        let store = MemoryStore::with_records(vec![
            draft("A", "1", 7).into_record(Utc::now()).unwrap(),
        ]);
        let service = TouchpointService::open(store).unwrap();
        let id = service.records()[0].id.to_string();
        assert_eq!(service.resolve(&id[..8]).unwrap().name, "A");
        assert!(service.resolve("zzzz").is_err());
        assert!(service.resolve("  ").is_err());
    }

    #[test]
    fn refresh_picks_up_external_writes() {
        let mut service = TouchpointService::open(MemoryStore::new()).unwrap();
        let outside = draft("A", "1", 7).into_record(Utc::now()).unwrap();
        service.store.insert(&outside).unwrap();
        assert!(service.records().is_empty());
        service.refresh().unwrap();
        assert_eq!(service.records().len(), 1);
    }
}
