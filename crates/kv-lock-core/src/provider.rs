//! Lock provider over a key-value store.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{LockError, LockResult};
use crate::lock::KvDistributedLock;
use crate::provision::{ProvisionSettings, ensure_table};
use crate::record::DEFAULT_TABLE_NAME;
use crate::retry::RetryPolicy;
use crate::traits::{KeyValueStore, LockProvider};

/// Builder for [`KvLockProvider`] configuration.
pub struct KvLockProviderBuilder<S> {
    store: Option<Arc<S>>,
    table_name: String,
    retry: RetryPolicy,
    provision: ProvisionSettings,
}

impl<S: KeyValueStore> KvLockProviderBuilder<S> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            store: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            retry: RetryPolicy::new(60, Duration::from_secs(5)),
            provision: ProvisionSettings::default(),
        }
    }

    /// Uses an already connected store.
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Number of retries `acquire(None)` makes before timing out.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry.interval = interval;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.retry.deadline = Some(deadline);
        self
    }

    pub fn create_table_if_missing(mut self, create: bool) -> Self {
        self.provision.create_if_missing = create;
        self
    }

    pub fn table_poll_interval(mut self, interval: Duration) -> Self {
        self.provision.poll_interval = interval;
        self
    }

    pub fn table_max_polls(mut self, max_polls: u32) -> Self {
        self.provision.max_polls = max_polls;
        self
    }

    /// Builds the provider, making sure the lock table is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if no store was given, the table name is empty, or
    /// the table cannot be provisioned.
    pub async fn build(self) -> LockResult<KvLockProvider<S>> {
        let store = self
            .store
            .ok_or_else(|| LockError::InvalidConfig("no store provided".to_string()))?;
        if self.table_name.trim().is_empty() {
            return Err(LockError::InvalidConfig("table name cannot be empty".to_string()));
        }

        ensure_table(store.as_ref(), &self.table_name, &self.provision).await?;

        Ok(KvLockProvider {
            store,
            table_name: self.table_name,
            retry: self.retry,
        })
    }
}

impl<S: KeyValueStore> Default for KvLockProviderBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for locks stored in one table of a key-value store.
pub struct KvLockProvider<S> {
    store: Arc<S>,
    table_name: String,
    retry: RetryPolicy,
}

impl<S: KeyValueStore> KvLockProvider<S> {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> KvLockProviderBuilder<S> {
        KvLockProviderBuilder::new()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: KeyValueStore> LockProvider for KvLockProvider<S> {
    type Lock = KvDistributedLock<S>;

    fn create_lock(&self, name: &str) -> Self::Lock {
        KvDistributedLock::new(
            self.store.clone(),
            self.table_name.clone(),
            name,
            self.retry.clone(),
        )
    }
}
