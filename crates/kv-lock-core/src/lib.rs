//! Core traits and types for locks built on a conditional-write key-value store.
//!
//! A lock is a single item keyed by `LockID` in a lock table. Acquiring is an
//! atomic put-if-absent, releasing is a delete, and the store's conditional
//! write is the only thing enforcing mutual exclusion.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod client;
pub mod error;
pub mod handle;
pub mod lock;
pub mod memory;
pub mod options;
pub mod prelude;
pub mod provider;
pub mod provision;
pub mod record;
pub mod retry;
pub mod status;
pub mod traits;

pub use client::{acquire_lock, acquire_lock_with_cancel, get_lock_status, release_lock, with_lock};
pub use error::{ErrorKind, LockError, LockResult, Operation, StoreError};
pub use handle::KvLockHandle;
pub use lock::KvDistributedLock;
pub use memory::{InMemoryStore, MemoryConnector};
pub use options::{DEFAULT_REGION, LockOptions};
pub use prelude::*;
pub use provider::{KvLockProvider, KvLockProviderBuilder};
pub use provision::{ProvisionSettings, ensure_table};
pub use record::{DEFAULT_TABLE_NAME, LOCK_ID_ATTRIBUTE, LockRecord, TableSchema, TableStatus};
pub use retry::{RetryOutcome, RetryPolicy, acquire_with_retry, retry_while_contended};
pub use status::{LockStatus, get_status};
