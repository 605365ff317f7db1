//! Conditional-write lock primitive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{Span, debug, info, instrument};

use crate::error::{LockError, LockResult, Operation, StoreError};
use crate::handle::KvLockHandle;
use crate::record::LockRecord;
use crate::retry::{RetryPolicy, acquire_with_retry};
use crate::traits::{DistributedLock, KeyValueStore};

/// Single attempt to take `lock_id`; never waits.
///
/// # Errors
///
/// * `AlreadyLocked` - a record for `lock_id` already exists
/// * `Store` - any other store failure (auth, network, throttling, missing table)
#[instrument(skip(store), fields(backend = "kv"))]
pub async fn try_acquire<S: KeyValueStore>(store: &S, table: &str, lock_id: &str) -> LockResult<()> {
    let record = LockRecord::new(lock_id);
    match store.put_if_absent(table, &record).await {
        Ok(()) => {
            info!("acquired lock");
            Ok(())
        }
        Err(source @ StoreError::ConditionFailed) => {
            debug!("lock already held");
            Err(LockError::AlreadyLocked {
                table: table.to_string(),
                lock_id: lock_id.to_string(),
                source,
            })
        }
        Err(source) => Err(LockError::store(
            Operation::PutIfAbsent,
            table,
            Some(lock_id),
            source,
        )),
    }
}

/// Deletes the record for `lock_id`.
///
/// Idempotent: releasing a lock nobody holds, or one whose table does not
/// exist, succeeds.
#[instrument(skip(store), fields(backend = "kv"))]
pub async fn release<S: KeyValueStore>(store: &S, table: &str, lock_id: &str) -> LockResult<()> {
    match store.delete(table, lock_id).await {
        Ok(()) => {
            info!("released lock");
            Ok(())
        }
        Err(StoreError::TableNotFound) => {
            debug!("lock table does not exist, nothing to release");
            Ok(())
        }
        Err(source) => Err(LockError::store(
            Operation::Delete,
            table,
            Some(lock_id),
            source,
        )),
    }
}

/// A lock on one key of a lock table.
///
/// The table is expected to exist; use
/// [`ensure_table`](crate::provision::ensure_table) or
/// [`KvLockProvider`](crate::provider::KvLockProvider) to provision it.
pub struct KvDistributedLock<S> {
    store: Arc<S>,
    table: String,
    lock_id: String,
    retry: RetryPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl<S: KeyValueStore> KvDistributedLock<S> {
    pub fn new(store: Arc<S>, table: impl Into<String>, lock_id: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            store,
            table: table.into(),
            lock_id: lock_id.into(),
            retry,
            cancel: None,
        }
    }

    /// Aborts waiting in `acquire` once `cancel` turns `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn handle(&self) -> KvLockHandle<S> {
        KvLockHandle::new(self.store.clone(), self.table.clone(), self.lock_id.clone())
    }
}

impl<S: KeyValueStore> DistributedLock for KvDistributedLock<S> {
    type Handle = KvLockHandle<S>;

    fn name(&self) -> &str {
        &self.lock_id
    }

    /// With `Some(timeout)` the wait is bounded by wall-clock time alone;
    /// with `None` the configured retry policy applies.
    #[instrument(skip(self), fields(lock.id = %self.lock_id, lock.table = %self.table, timeout = ?timeout, backend = "kv", acquired = tracing::field::Empty))]
    async fn acquire(&self, timeout: Option<Duration>) -> LockResult<Self::Handle> {
        let policy = match timeout {
            Some(timeout) => RetryPolicy::until(timeout, self.retry.interval),
            None => self.retry.clone(),
        };

        let result = acquire_with_retry(
            self.store.as_ref(),
            &self.table,
            &self.lock_id,
            &policy,
            self.cancel.as_ref(),
        )
        .await;

        Span::current().record("acquired", result.is_ok());
        result.map(|()| self.handle())
    }

    #[instrument(skip(self), fields(lock.id = %self.lock_id, lock.table = %self.table, backend = "kv", acquired = tracing::field::Empty))]
    async fn try_acquire(&self) -> LockResult<Option<Self::Handle>> {
        match try_acquire(self.store.as_ref(), &self.table, &self.lock_id).await {
            Ok(()) => {
                Span::current().record("acquired", true);
                Ok(Some(self.handle()))
            }
            Err(LockError::AlreadyLocked { .. }) => {
                Span::current().record("acquired", false);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
