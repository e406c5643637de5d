//! Calculation history: records, storage backends, the store and display queries

mod record;
mod store;
mod query;
pub mod storage;

pub use record::{Calculation, CalculationRecord, RecordId};
pub use store::{HistoryError, HistoryResult, HistoryStore, PersistenceError, DEFAULT_STORAGE_KEY};
pub use query::{project, MethodFilter, ParseFilterError, ParseSortError, SortKey};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
