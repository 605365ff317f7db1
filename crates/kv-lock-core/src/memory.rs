//! In-process store with the same contract as a remote lock table.
//!
//! Useful for tests and single-process runs. A single mutex makes every
//! operation atomic, which gives put-if-absent the linearizability the lock
//! relies on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{LockError, LockResult, StoreError};
use crate::record::{LockRecord, TableSchema, TableStatus};
use crate::traits::{KeyValueStore, StoreConnector};

#[derive(Debug, Default)]
struct MemoryTable {
    /// Describe calls left before the table reports active.
    pending_polls: u32,
    items: HashMap<String, LockRecord>,
}

impl MemoryTable {
    fn is_active(&self) -> bool {
        self.pending_polls == 0
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
    activation_delay: u32,
    put_calls: AtomicU32,
    describe_calls: AtomicU32,
    create_calls: AtomicU32,
}

impl InMemoryStore {
    /// A store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding one empty, active table.
    pub fn with_active_table(table: &str) -> Self {
        let store = Self::new();
        store.tables().insert(table.to_string(), MemoryTable::default());
        store
    }

    /// Newly created tables report `CREATING` for this many describe calls.
    pub fn activation_delay(mut self, polls: u32) -> Self {
        self.activation_delay = polls;
        self
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables().contains_key(table)
    }

    /// Peeks at a table's status without counting as a describe call.
    pub fn table_status(&self, table: &str) -> Option<TableStatus> {
        self.tables().get(table).map(|t| {
            if t.is_active() {
                TableStatus::Active
            } else {
                TableStatus::Creating
            }
        })
    }

    pub fn item_count(&self, table: &str) -> usize {
        self.tables().get(table).map_or(0, |t| t.items.len())
    }

    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn describe_calls(&self) -> u32 {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<String, MemoryTable>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for InMemoryStore {
    async fn put_if_absent(&self, table: &str, record: &LockRecord) -> Result<(), StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables();
        // Like DynamoDB, a table that is still being created rejects writes
        let table = tables
            .get_mut(table)
            .filter(|t| t.is_active())
            .ok_or(StoreError::TableNotFound)?;

        if table.items.contains_key(&record.lock_id) {
            return Err(StoreError::ConditionFailed);
        }
        table.items.insert(record.lock_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        let mut tables = self.tables();
        let table = tables
            .get_mut(table)
            .filter(|t| t.is_active())
            .ok_or(StoreError::TableNotFound)?;
        table.items.remove(key);
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &str) -> Result<Option<LockRecord>, StoreError> {
        let tables = self.tables();
        let table = tables
            .get(table)
            .filter(|t| t.is_active())
            .ok_or(StoreError::TableNotFound)?;
        Ok(table.items.get(key).cloned())
    }

    async fn describe_table(&self, table: &str) -> Result<TableStatus, StoreError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables();
        let table = tables.get_mut(table).ok_or(StoreError::TableNotFound)?;
        if table.pending_polls > 0 {
            table.pending_polls -= 1;
            return Ok(TableStatus::Creating);
        }
        Ok(TableStatus::Active)
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables();
        if tables.contains_key(&schema.table_name) {
            return Err(StoreError::TableInUse);
        }
        tables.insert(
            schema.table_name.clone(),
            MemoryTable {
                pending_polls: self.activation_delay,
                items: HashMap::new(),
            },
        );
        Ok(())
    }
}

/// Connector handing out one shared [`InMemoryStore`] regardless of region.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: Arc<InMemoryStore>,
}

impl MemoryConnector {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<InMemoryStore> {
        &self.store
    }
}

impl StoreConnector for MemoryConnector {
    type Store = Arc<InMemoryStore>;

    async fn connect(&self, region: &str, _endpoint: Option<&str>) -> LockResult<Self::Store> {
        if region.is_empty() {
            return Err(LockError::InvalidConfig("region cannot be empty".to_string()));
        }
        Ok(self.store.clone())
    }
}
