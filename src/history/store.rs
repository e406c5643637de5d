//! Calculation history store
//!
//! Owns the ordered record collection (newest first) and mirrors every
//! mutation to a storage backend as one JSON snapshot.
//!
//! A failed write is returned to the caller but the in-memory change is
//! kept; memory and storage may differ until the next successful write.

use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use thiserror::Error;

use super::record::{Calculation, CalculationRecord, RecordId};
use super::storage::{StorageBackend, StorageError};

/// Default key the snapshot is stored under
pub const DEFAULT_STORAGE_KEY: &str = "depositCalculations";

/// Failure reading or writing the persisted snapshot
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read saved history: {0}")]
    Read(#[source] StorageError),

    #[error("saved history is corrupt: {0}")]
    Corrupt(String),

    #[error("dropped {dropped} of {total} saved records: {reason}")]
    DroppedRecords {
        dropped: usize,
        total: usize,
        reason: String,
    },

    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to save history: {0}")]
    Write(#[source] StorageError),
}

impl PersistenceError {
    /// True when the backend ran out of space; callers should suggest
    /// deleting some entries
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            PersistenceError::Write(StorageError::QuotaExceeded { .. })
        )
    }
}

/// Errors returned by history operations
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("calculation not found: {0}")]
    NotFound(RecordId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Ordered, persisted collection of calculation records
pub struct HistoryStore<S: StorageBackend> {
    backend: S,
    key: String,
    records: Vec<CalculationRecord>,
    load_error: Option<PersistenceError>,
}

impl<S: StorageBackend> HistoryStore<S> {
    /// Open the store under the default key
    pub fn open(backend: S) -> Self {
        Self::open_with_key(backend, DEFAULT_STORAGE_KEY)
    }

    /// Open the store and load the last snapshot saved under `key`
    ///
    /// A missing snapshot starts empty. An unreadable or corrupt one is
    /// logged, starts empty and is reported through [`Self::load_error`].
    /// Individual records that fail to decode or break the record
    /// invariants are skipped; the rest of the history is kept.
    pub fn open_with_key(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let (records, load_error) = match load_snapshot(&backend, &key) {
            Ok((records, None)) => {
                info!("event=history_load status=ok key={} records={}", key, records.len());
                (records, None)
            }
            Ok((records, Some(err))) => {
                warn!(
                    "event=history_load status=partial key={} records={} error={}",
                    key,
                    records.len(),
                    err
                );
                (records, Some(err))
            }
            Err(err) => {
                warn!("event=history_load status=degraded key={} error={}", key, err);
                (Vec::new(), Some(err))
            }
        };

        Self {
            backend,
            key,
            records,
            load_error,
        }
    }

    /// Why the last load fell back to an empty history or dropped records
    pub fn load_error(&self) -> Option<&PersistenceError> {
        self.load_error.as_ref()
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Records in storage order, newest first
    pub fn all(&self) -> &[CalculationRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&CalculationRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store a calculation dated today (UTC)
    pub fn add(&mut self, calculation: Calculation) -> HistoryResult<CalculationRecord> {
        self.add_dated(calculation, Utc::now().date_naive())
    }

    /// Store a calculation with an explicit creation date
    ///
    /// The record is placed at the front. On a persistence failure it stays
    /// in memory and remains reachable through [`Self::all`].
    pub fn add_dated(
        &mut self,
        calculation: Calculation,
        created_at: NaiveDate,
    ) -> HistoryResult<CalculationRecord> {
        let mut id = RecordId::generate();
        while self.get(&id).is_some() {
            id = RecordId::generate();
        }

        let record = CalculationRecord::new(id, calculation, created_at);
        debug!("event=history_add id={} method={}", record.id(), record.method());
        self.records.insert(0, record.clone());
        self.persist()?;
        Ok(record)
    }

    /// Change a record's label; a blank name clears it
    pub fn rename(&mut self, id: &RecordId, name: &str) -> HistoryResult<()> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| HistoryError::NotFound(id.clone()))?;

        record.set_name(name.trim().to_string());
        debug!("event=history_rename id={}", id);
        self.persist()?;
        Ok(())
    }

    /// Remove a record
    pub fn delete(&mut self, id: &RecordId) -> HistoryResult<()> {
        self.take(id).map(|_| ())
    }

    /// Remove a record and hand it back, e.g. to refill an input form for editing
    pub fn take(&mut self, id: &RecordId) -> HistoryResult<CalculationRecord> {
        let index = self
            .records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| HistoryError::NotFound(id.clone()))?;

        let record = self.records.remove(index);
        debug!("event=history_remove id={}", id);
        self.persist()?;
        Ok(record)
    }

    /// Remove every record
    pub fn clear(&mut self) -> HistoryResult<()> {
        let removed = self.records.len();
        self.records.clear();
        debug!("event=history_clear removed={}", removed);
        self.persist()?;
        Ok(())
    }

    /// Write the full collection to the backend
    ///
    /// Called by every mutation; exposed so callers can retry after a
    /// failed write.
    pub fn persist(&mut self) -> HistoryResult<()> {
        let bytes = serde_json::to_vec(&self.records).map_err(PersistenceError::Encode)?;
        match self.backend.set(&self.key, &bytes) {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(
                    "event=history_persist status=error key={} bytes={} error={}",
                    self.key,
                    bytes.len(),
                    err
                );
                Err(PersistenceError::Write(err).into())
            }
        }
    }
}

fn load_snapshot<S: StorageBackend>(
    backend: &S,
    key: &str,
) -> Result<(Vec<CalculationRecord>, Option<PersistenceError>), PersistenceError> {
    let bytes = match backend.get(key).map_err(PersistenceError::Read)? {
        Some(bytes) => bytes,
        None => return Ok((Vec::new(), None)),
    };

    let entries: Vec<serde_json::Value> = serde_json::from_slice(&bytes)
        .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;

    let total = entries.len();
    let mut records = Vec::with_capacity(total);
    let mut seen = HashSet::with_capacity(total);
    let mut first_reason = None;
    let mut dropped = 0;

    for (index, entry) in entries.into_iter().enumerate() {
        let checked = serde_json::from_value::<CalculationRecord>(entry)
            .map_err(|err| format!("record #{}: {}", index, err))
            .and_then(|record| record.check_invariants().map(|()| record))
            .and_then(|record| {
                if seen.insert(record.id().clone()) {
                    Ok(record)
                } else {
                    Err(format!("duplicate record id {}", record.id()))
                }
            });

        match checked {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!("event=history_load_skip key={} index={} reason={}", key, index, reason);
                dropped += 1;
                if first_reason.is_none() {
                    first_reason = Some(reason);
                }
            }
        }
    }

    let dropped_error = first_reason.map(|reason| PersistenceError::DroppedRecords {
        dropped,
        total,
        reason,
    });
    Ok((records, dropped_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{DepositTerms, InterestMethod};
    use crate::history::storage::MemoryStorage;

    fn calc(principal: f64, rate: f64, years: f64, method: InterestMethod) -> Calculation {
        Calculation::new(DepositTerms::new(principal, rate, years).unwrap(), method)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    /// Backend whose reads or writes can be switched off
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl StorageBackend for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "storage unavailable",
                )));
            }
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    capacity: 0,
                });
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_open_empty_backend() {
        let store = HistoryStore::open(MemoryStorage::new());
        assert!(store.is_empty());
        assert!(store.load_error().is_none());
        assert_eq!(store.storage_key(), DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_add_prepends_and_persists() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        let first = store
            .add_dated(calc(1_000_000.0, 5.0, 3.0, InterestMethod::Simple), date(1))
            .unwrap();
        let second = store
            .add_dated(calc(2_000_000.0, 4.0, 2.0, InterestMethod::Compound), date(2))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.all()[0].id(), second.id());
        assert_eq!(store.all()[1].id(), first.id());
        assert_ne!(first.id(), second.id());
        assert_eq!(first.total_amount(), 1_150_000.0);

        let raw = store.backend().raw(DEFAULT_STORAGE_KEY).unwrap();
        let persisted: Vec<CalculationRecord> = serde_json::from_slice(raw).unwrap();
        assert_eq!(persisted, store.all());
    }

    #[test]
    fn test_add_uses_today_by_default() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        let record = store.add(calc(1000.0, 1.0, 1.0, InterestMethod::Simple)).unwrap();
        assert_eq!(record.created_at(), Utc::now().date_naive());
    }

    #[test]
    fn test_delete_and_not_found() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        let a = store.add_dated(calc(1000.0, 1.0, 1.0, InterestMethod::Simple), date(1)).unwrap();
        let b = store.add_dated(calc(2000.0, 1.0, 1.0, InterestMethod::Simple), date(1)).unwrap();

        store.delete(a.id()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(a.id()).is_none());
        assert!(store.get(b.id()).is_some());

        let err = store.delete(a.id()).unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(ref id) if id == a.id()));

        let err = store.delete(&RecordId::from("missing")).unwrap_err();
        assert_eq!(err.to_string(), "calculation not found: missing");
    }

    #[test]
    fn test_rename_trims_and_clears() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        let record = store
            .add_dated(
                calc(1000.0, 1.0, 1.0, InterestMethod::Simple).with_name("old"),
                date(3),
            )
            .unwrap();

        store.rename(record.id(), "  적금 A  ").unwrap();
        assert_eq!(store.get(record.id()).unwrap().name(), "적금 A");

        store.rename(record.id(), "   ").unwrap();
        assert_eq!(store.get(record.id()).unwrap().name(), "");

        // Derived values are untouched
        assert_eq!(store.get(record.id()).unwrap().total_amount(), record.total_amount());

        assert!(matches!(
            store.rename(&RecordId::from("nope"), "x"),
            Err(HistoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_take_returns_removed_record() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        let record = store
            .add_dated(calc(3000.0, 2.0, 2.0, InterestMethod::Compound).with_name("edit me"), date(4))
            .unwrap();

        let taken = store.take(record.id()).unwrap();
        assert_eq!(taken, record);
        assert!(store.is_empty());
        assert!(store.take(record.id()).is_err());
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        for day in 1..=3 {
            store.add_dated(calc(1000.0, 1.0, 1.0, InterestMethod::Simple), date(day)).unwrap();
        }
        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.backend().raw(DEFAULT_STORAGE_KEY), Some(&b"[]"[..]));

        // Clearing an empty store is not an error
        store.clear().unwrap();
    }

    #[test]
    fn test_reload_yields_identical_sequence() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        store.add_dated(calc(1234.56, 3.3, 2.5, InterestMethod::Compound).with_name("a"), date(1)).unwrap();
        store.add_dated(calc(987_654.321, 7.25, 12.75, InterestMethod::Simple), date(2)).unwrap();
        store.add_dated(calc(0.1, 0.1, 0.1, InterestMethod::Compound).with_name("b"), date(3)).unwrap();

        let before = store.all().to_vec();
        let backend = store.backend().clone();
        let reloaded = HistoryStore::open(backend);

        assert!(reloaded.load_error().is_none());
        assert_eq!(reloaded.all(), before.as_slice());
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let mut backend = MemoryStorage::new();
        backend.insert_raw(DEFAULT_STORAGE_KEY, "{not json");
        let store = HistoryStore::open(backend);
        assert!(store.is_empty());
        assert!(matches!(store.load_error(), Some(PersistenceError::Corrupt(_))));
    }

    #[test]
    fn test_duplicate_ids_keep_first_record() {
        let mut backend = MemoryStorage::new();
        backend.insert_raw(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"a","name":"first","principal":100,"rate":5,"years":1,"type":"simple",
                "interest":5,"totalAmount":105,"createdAt":"2024-01-01"},
               {"id":"a","name":"second","principal":100,"rate":5,"years":1,"type":"simple",
                "interest":5,"totalAmount":105,"createdAt":"2024-01-01"}]"#,
        );
        let store = HistoryStore::open(backend);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].name(), "first");
        let message = store.load_error().unwrap().to_string();
        assert!(message.contains("duplicate record id a"), "{message}");
    }

    #[test]
    fn test_bad_record_does_not_discard_history() {
        let mut backend = MemoryStorage::new();
        backend.insert_raw(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"bad","name":"","principal":1000000,"rate":100,"years":1100,"type":"compound",
                "interest":null,"totalAmount":null,"createdAt":"2024-01-02"},
               {"id":"good","name":"","principal":100,"rate":5,"years":1,"type":"simple",
                "interest":5,"totalAmount":105,"createdAt":"2024-01-01"},
               {"id":"wrong","name":"","principal":100,"rate":5,"years":1,"type":"simple",
                "interest":5,"totalAmount":999,"createdAt":"2024-01-01"}]"#,
        );
        let store = HistoryStore::open(backend);

        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].id().as_str(), "good");
        match store.load_error() {
            Some(PersistenceError::DroppedRecords { dropped, total, reason }) => {
                assert_eq!((*dropped, *total), (2, 3));
                assert!(reason.starts_with("record #0"), "{reason}");
            }
            other => panic!("unexpected load result: {other:?}"),
        }
    }

    #[test]
    fn test_unrepresentable_terms_never_reach_storage() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        store.add_dated(calc(1000.0, 1.0, 1.0, InterestMethod::Simple), date(1)).unwrap();

        assert!(DepositTerms::new(1_000_000.0, 100.0, 1100.0).is_err());
        store
            .add_dated(calc(1_000_000.0, 100.0, 1000.0, InterestMethod::Compound), date(2))
            .unwrap();
        assert!(store.all().iter().all(|r| r.total_amount().is_finite()));

        let reloaded = HistoryStore::open(store.backend().clone());
        assert!(reloaded.load_error().is_none());
        assert_eq!(reloaded.all(), store.all());
    }

    #[test]
    fn test_read_failure_starts_empty() {
        let backend = FlakyStorage {
            fail_reads: true,
            ..FlakyStorage::default()
        };
        let mut store = HistoryStore::open(backend);
        assert!(store.is_empty());
        assert!(matches!(store.load_error(), Some(PersistenceError::Read(StorageError::Io(_)))));

        // Writes still work once the store is open
        store.add_dated(calc(1000.0, 1.0, 1.0, InterestMethod::Simple), date(1)).unwrap();
        assert!(store.backend.inner.raw(DEFAULT_STORAGE_KEY).is_some());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = HistoryStore::open(FlakyStorage::default());
        let kept = store
            .add_dated(calc(1000.0, 1.0, 1.0, InterestMethod::Simple), date(1))
            .unwrap();

        store.backend.fail_writes = true;
        let err = store
            .add_dated(calc(2000.0, 2.0, 2.0, InterestMethod::Compound), date(2))
            .unwrap_err();
        match err {
            HistoryError::Persistence(ref inner) => assert!(inner.is_quota_exceeded()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.len(), 2);

        assert!(matches!(store.delete(kept.id()), Err(HistoryError::Persistence(_))));
        assert_eq!(store.len(), 1);
        assert!(store.get(kept.id()).is_none());

        // Storage still holds the last good snapshot
        let stale: Vec<CalculationRecord> =
            serde_json::from_slice(store.backend.inner.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id(), kept.id());

        // A later successful persist converges storage with memory
        store.backend.fail_writes = false;
        store.persist().unwrap();
        let fresh: Vec<CalculationRecord> =
            serde_json::from_slice(store.backend.inner.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(fresh, store.all());
    }

    #[test]
    fn test_custom_key() {
        let mut store = HistoryStore::open_with_key(MemoryStorage::new(), "other");
        store.add_dated(calc(1000.0, 1.0, 1.0, InterestMethod::Simple), date(1)).unwrap();
        assert!(store.backend().raw("other").is_some());
        assert!(store.backend().raw(DEFAULT_STORAGE_KEY).is_none());
    }
}
