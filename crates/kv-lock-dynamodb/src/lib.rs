//! Amazon DynamoDB backend for key-value store locks.
//!
//! Each lock is an item in a table whose hash key is the string attribute
//! `LockID`. Acquisition is a `PutItem` conditioned on
//! `attribute_not_exists(LockID)`, and release is an unconditional
//! `DeleteItem`.
//!
//! ```rust,no_run
//! use kv_lock_core::{LockOptions, acquire_lock, release_lock};
//! use kv_lock_dynamodb::DynamoDbConnector;
//!
//! # async fn run() -> kv_lock_core::LockResult<()> {
//! let connector = DynamoDbConnector::new();
//! let options = LockOptions::new("deploy-production").create_table_if_missing(true);
//!
//! acquire_lock(&connector, &options).await?;
//! // ... critical section ...
//! release_lock(&connector, &options).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod client;
pub mod connector;
pub mod error;
pub mod item;

pub use client::DynamoDbStore;
pub use connector::DynamoDbConnector;
