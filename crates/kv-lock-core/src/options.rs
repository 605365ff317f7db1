//! Options for one acquire/release cycle.

use std::time::Duration;

use crate::error::{LockError, LockResult};
use crate::provision::ProvisionSettings;
use crate::record::DEFAULT_TABLE_NAME;
use crate::retry::RetryPolicy;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Everything one acquire/release cycle needs.
///
/// Built once per cycle and passed to every operation; nothing is read from
/// process-wide state.
///
/// ```rust
/// use kv_lock_core::LockOptions;
/// use std::time::Duration;
///
/// let options = LockOptions::new("deploy-prod")
///     .region("eu-west-1")
///     .table_name("release-locks")
///     .max_retries(10)
///     .retry_interval(Duration::from_secs(2))
///     .create_table_if_missing(true);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct LockOptions {
    pub region: String,
    /// Endpoint override, e.g. DynamoDB Local.
    pub endpoint: Option<String>,
    pub table_name: String,
    pub lock_id: String,
    pub max_retries: u32,
    pub retry_interval: Duration,
    /// Wall-clock cap on waiting, on top of `max_retries`.
    pub deadline: Option<Duration>,
    pub create_table_if_missing: bool,
    pub table_poll_interval: Duration,
    pub table_max_polls: u32,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            lock_id: String::new(),
            max_retries: 60,
            retry_interval: Duration::from_secs(5),
            deadline: None,
            create_table_if_missing: false,
            table_poll_interval: Duration::from_secs(2),
            table_max_polls: 30,
        }
    }
}

impl LockOptions {
    /// Options for `lock_id` with defaults for everything else.
    pub fn new(lock_id: impl Into<String>) -> Self {
        Self {
            lock_id: lock_id.into(),
            ..Self::default()
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn create_table_if_missing(mut self, create: bool) -> Self {
        self.create_table_if_missing = create;
        self
    }

    pub fn table_poll_interval(mut self, interval: Duration) -> Self {
        self.table_poll_interval = interval;
        self
    }

    pub fn table_max_polls(mut self, max_polls: u32) -> Self {
        self.table_max_polls = max_polls;
        self
    }

    /// Rejects empty identifiers before any store call is made.
    pub fn validate(&self) -> LockResult<()> {
        if self.region.trim().is_empty() {
            return Err(LockError::InvalidConfig("region cannot be empty".to_string()));
        }
        if self.table_name.trim().is_empty() {
            return Err(LockError::InvalidConfig("table name cannot be empty".to_string()));
        }
        if self.lock_id.is_empty() {
            return Err(LockError::InvalidConfig("lock id cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            interval: self.retry_interval,
            deadline: self.deadline,
        }
    }

    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            create_if_missing: self.create_table_if_missing,
            poll_interval: self.table_poll_interval,
            max_polls: self.table_max_polls,
        }
    }
}
