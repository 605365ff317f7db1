//! Store wrapper that injects infrastructure failures.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use kv_lock_core::error::{LockError, LockResult, StoreError};
use kv_lock_core::memory::InMemoryStore;
use kv_lock_core::record::{LockRecord, TableSchema, TableStatus};
use kv_lock_core::traits::{KeyValueStore, StoreConnector};

/// Wraps an [`InMemoryStore`] and fails selected operations on demand.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_gets: AtomicBool,
    put_attempts: AtomicU32,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Every put, whether it reached the inner store or not.
    pub fn put_attempts(&self) -> u32 {
        self.put_attempts.load(Ordering::SeqCst)
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::service(io::Error::new(
        io::ErrorKind::ConnectionReset,
        format!("injected {what} failure"),
    ))
}

impl KeyValueStore for FaultyStore {
    async fn put_if_absent(&self, table: &str, record: &LockRecord) -> Result<(), StoreError> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.inner.put_if_absent(table, record).await
    }

    async fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(table, key).await
    }

    async fn get_item(&self, table: &str, key: &str) -> Result<Option<LockRecord>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(injected("get"));
        }
        self.inner.get_item(table, key).await
    }

    async fn describe_table(&self, table: &str) -> Result<TableStatus, StoreError> {
        self.inner.describe_table(table).await
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        self.inner.create_table(schema).await
    }
}

/// Connector that always hands out the same [`FaultyStore`].
#[derive(Debug, Clone)]
pub struct FaultyConnector {
    store: Arc<FaultyStore>,
}

impl FaultyConnector {
    pub fn new(store: Arc<FaultyStore>) -> Self {
        Self { store }
    }
}

impl StoreConnector for FaultyConnector {
    type Store = Arc<FaultyStore>;

    async fn connect(&self, region: &str, _endpoint: Option<&str>) -> LockResult<Self::Store> {
        if region.is_empty() {
            return Err(LockError::InvalidConfig("region cannot be empty".to_string()));
        }
        Ok(self.store.clone())
    }
}
