//! Distributed locks on a key-value store with conditional writes.
//!
//! A lock is one item in a lock table. Whoever manages to insert the item
//! holds the lock until they delete it. The store's put-if-absent is the only
//! arbiter, so any number of processes on any number of machines can share a
//! lock as long as they point at the same table.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kv_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = LockOptions::new("nightly-migration")
//!         .region("eu-west-1")
//!         .max_retries(12)
//!         .retry_interval(Duration::from_secs(5))
//!         .create_table_if_missing(true);
//!
//!     let rows = with_lock(&DynamoDbConnector::new(), &options, || async {
//!         // Critical section - no other holder of "nightly-migration" runs now
//!         Ok::<_, LockError>(42)
//!     })
//!     .await?;
//!
//!     println!("migrated {rows} rows");
//!     Ok(())
//! }
//! ```
//!
//! # Provider API
//!
//! For code that hands out many locks from one table, build a provider once
//! and create locks by name:
//!
//! ```rust,no_run
//! use kv_lock::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> LockResult<()> {
//! let store = DynamoDbConnector::new().connect("us-east-1", None).await?;
//! let provider = KvLockProvider::builder()
//!     .store(Arc::new(store))
//!     .table_name("DistributedLocks")
//!     .build()
//!     .await?;
//!
//! let lock = provider.create_lock("my-resource");
//! let handle = lock.acquire(Some(Duration::from_secs(30))).await?;
//! handle.release().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `kv-lock-core`: traits, the lock protocol, retry and provisioning logic,
//!   and an in-memory store
//! - `kv-lock-dynamodb`: the Amazon DynamoDB store
//!
//! For fine-grained control, you can depend on individual crates instead.

pub use kv_lock_core::*;

pub use kv_lock_dynamodb::{DynamoDbConnector, DynamoDbStore};
