//! Core traits for key-value store backed distributed locks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LockResult, StoreError};
use crate::record::{LockRecord, TableSchema, TableStatus};

// ============================================================================
// Store Contract
// ============================================================================

/// The key-value store a lock table lives in.
///
/// Correctness of the locks rests entirely on [`put_if_absent`] being atomic
/// and linearizable at the store: of two racing calls for the same key,
/// exactly one may succeed.
///
/// [`put_if_absent`]: KeyValueStore::put_if_absent
pub trait KeyValueStore: Send + Sync {
    /// Inserts `record` only if no item with the same key exists.
    ///
    /// Returns `Err(StoreError::ConditionFailed)` when the key is taken.
    fn put_if_absent(
        &self,
        table: &str,
        record: &LockRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the item with the given key. Deleting an absent key succeeds.
    fn delete(&self, table: &str, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Strongly consistent point read.
    fn get_item(
        &self,
        table: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<LockRecord>, StoreError>> + Send;

    /// Returns the table status, or `Err(StoreError::TableNotFound)`.
    fn describe_table(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<TableStatus, StoreError>> + Send;

    /// Starts creating a table. Returns `Err(StoreError::TableInUse)` if the
    /// table already exists or is being created.
    fn create_table(
        &self,
        schema: &TableSchema,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    fn put_if_absent(
        &self,
        table: &str,
        record: &LockRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).put_if_absent(table, record)
    }

    fn delete(&self, table: &str, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).delete(table, key)
    }

    fn get_item(
        &self,
        table: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<LockRecord>, StoreError>> + Send {
        (**self).get_item(table, key)
    }

    fn describe_table(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<TableStatus, StoreError>> + Send {
        (**self).describe_table(table)
    }

    fn create_table(
        &self,
        schema: &TableSchema,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).create_table(schema)
    }
}

/// Resolves ambient credentials and yields a connected store.
///
/// Tests substitute a connector handing out an in-memory store.
pub trait StoreConnector: Send + Sync {
    /// The store type this connector produces.
    type Store: KeyValueStore;

    /// Connects to the store in `region`, optionally at an explicit endpoint.
    ///
    /// # Errors
    ///
    /// * `Err(LockError::Credentials)` - credentials could not be resolved
    /// * `Err(LockError::InvalidConfig)` - empty region
    fn connect(
        &self,
        region: &str,
        endpoint: Option<&str>,
    ) -> impl Future<Output = LockResult<Self::Store>> + Send;
}

// ============================================================================
// Lock Handle Trait
// ============================================================================

/// Handle to a held distributed lock.
///
/// Records carry no expiry, so a handle that is dropped without calling
/// `release()` leaves the lock held until someone deletes the record.
///
/// # Example
///
/// ```rust,ignore
/// let handle = lock.acquire(None).await?;
/// // Critical section - we hold the lock
/// do_work().await;
/// handle.release().await?;
/// ```
pub trait LockHandle: Send + Sync + Sized {
    /// Returns a receiver that signals when the lock is lost.
    ///
    /// Backends without loss detection return a receiver that never changes
    /// from `false`.
    fn lost_token(&self) -> &tokio::sync::watch::Receiver<bool>;

    /// Explicitly releases the lock.
    fn release(self) -> impl Future<Output = LockResult<()>> + Send;
}

// ============================================================================
// Distributed Lock Trait
// ============================================================================

/// A distributed mutual exclusion lock.
///
/// # Example
///
/// ```rust,ignore
/// use kv_lock_core::DistributedLock;
///
/// async fn protected_operation(lock: &impl DistributedLock) -> LockResult<()> {
///     let handle = lock.acquire(Some(Duration::from_secs(5))).await?;
///     perform_critical_section().await?;
///     handle.release().await?;
///     Ok(())
/// }
/// ```
pub trait DistributedLock: Send + Sync {
    /// The handle type returned when the lock is acquired.
    type Handle: LockHandle + Send;

    /// Returns the unique name identifying this lock.
    fn name(&self) -> &str;

    /// Acquires the lock, waiting up to `timeout`.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait. `None` means the backend's
    ///   configured retry budget.
    ///
    /// # Returns
    ///
    /// * `Ok(handle)` - Lock acquired successfully
    /// * `Err(LockError::TimeoutExceeded)` - Still held elsewhere when the budget ran out
    /// * `Err(LockError::Cancelled)` - Operation was cancelled
    /// * `Err(LockError::Store)` - Backend failure, not retried
    fn acquire(
        &self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = LockResult<Self::Handle>> + Send;

    /// Attempts to acquire the lock without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(handle))` - Lock acquired successfully
    /// * `Ok(None)` - Lock is held by another process
    /// * `Err(...)` - Error occurred during attempt
    fn try_acquire(&self) -> impl Future<Output = LockResult<Option<Self::Handle>>> + Send;
}

// ============================================================================
// Provider Traits
// ============================================================================

/// Factory for creating distributed locks by name.
///
/// # Example
///
/// ```rust,ignore
/// let provider = KvLockProvider::builder().store(store).build().await?;
/// let lock = provider.create_lock("my-resource");
/// let handle = lock.acquire(None).await?;
/// ```
pub trait LockProvider: Send + Sync {
    /// The lock type created by this provider.
    type Lock: DistributedLock;

    /// Creates a lock with the given name.
    fn create_lock(&self, name: &str) -> Self::Lock;
}

// ============================================================================
// Convenience Extensions
// ============================================================================

/// Extension trait providing convenience methods for lock providers.
pub trait LockProviderExt: LockProvider {
    /// Acquires a lock by name, returning the handle.
    fn acquire_lock(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = LockResult<<Self::Lock as DistributedLock>::Handle>> + Send
    where
        Self: Sync,
    {
        async move {
            let lock = self.create_lock(name);
            lock.acquire(timeout).await
        }
    }

    /// Tries to acquire a lock by name.
    fn try_acquire_lock(
        &self,
        name: &str,
    ) -> impl Future<Output = LockResult<Option<<Self::Lock as DistributedLock>::Handle>>> + Send
    where
        Self: Sync,
    {
        async move {
            let lock = self.create_lock(name);
            lock.try_acquire().await
        }
    }
}

// Blanket implementation for all LockProviders
impl<T: LockProvider> LockProviderExt for T {}
