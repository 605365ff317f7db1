//! Read-only inspection of a lock key.

use tracing::{debug, instrument};

use crate::error::{LockError, LockResult, Operation, StoreError};
use crate::record::LockRecord;
use crate::traits::KeyValueStore;

/// Current state of one lock key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockStatus {
    /// `true` iff a record exists for the key.
    pub held: bool,
    pub record: Option<LockRecord>,
}

impl LockStatus {
    fn from_record(record: Option<LockRecord>) -> Self {
        Self {
            held: record.is_some(),
            record,
        }
    }
}

/// Point read of `lock_id`. Never writes.
///
/// A table that does not exist cannot hold a record, so it reports
/// `held = false` instead of an error.
#[instrument(skip(store), fields(backend = "kv"))]
pub async fn get_status<S: KeyValueStore>(store: &S, table: &str, lock_id: &str) -> LockResult<LockStatus> {
    match store.get_item(table, lock_id).await {
        Ok(record) => {
            debug!(held = record.is_some(), "read lock status");
            Ok(LockStatus::from_record(record))
        }
        Err(StoreError::TableNotFound) => {
            debug!("lock table does not exist");
            Ok(LockStatus::from_record(None))
        }
        Err(source) => Err(LockError::store(
            Operation::GetItem,
            table,
            Some(lock_id),
            source,
        )),
    }
}
