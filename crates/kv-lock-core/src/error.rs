//! Error types for distributed lock operations.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::record::TableStatus;

/// Boxed error from a backend SDK or transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures reported by a [`KeyValueStore`](crate::traits::KeyValueStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The conditional write predicate did not hold.
    #[error("conditional check failed")]
    ConditionFailed,

    /// The table does not exist (or is not yet visible).
    #[error("table not found")]
    TableNotFound,

    /// The table is already being created or updated.
    #[error("table is already being created or updated")]
    TableInUse,

    /// Anything else: throttling, network, permissions.
    #[error(transparent)]
    Service(BoxError),
}

impl StoreError {
    /// Wraps an arbitrary backend error.
    pub fn service(err: impl Into<BoxError>) -> Self {
        Self::Service(err.into())
    }
}

/// The store call that failed, kept for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PutIfAbsent,
    Delete,
    GetItem,
    DescribeTable,
    CreateTable,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PutIfAbsent => "put-if-absent",
            Self::Delete => "delete",
            Self::GetItem => "get-item",
            Self::DescribeTable => "describe-table",
            Self::CreateTable => "create-table",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// No authenticated store connection could be established.
    #[error("failed to resolve store credentials: {0}")]
    Credentials(#[source] BoxError),

    /// The lock table is missing and cannot be created.
    #[error("cannot provision lock table {table}: {reason}")]
    Provisioning { table: String, reason: String },

    /// The lock table did not reach the active state in time.
    #[error("lock table {table} not active after {attempts} status checks (last status: {last_status})")]
    TableNotActive {
        table: String,
        attempts: u32,
        last_status: TableStatus,
    },

    /// Another holder owns the lock.
    #[error("lock {lock_id} in table {table} is already held")]
    AlreadyLocked {
        table: String,
        lock_id: String,
        #[source]
        source: StoreError,
    },

    /// Infrastructure failure unrelated to contention.
    #[error("{operation} on table {table}{} failed: {source}", key_suffix(.lock_id))]
    Store {
        operation: Operation,
        table: String,
        lock_id: Option<String>,
        #[source]
        source: StoreError,
    },

    /// Retry budget exhausted while the lock was still held elsewhere.
    #[error("timed out acquiring lock {lock_id} in table {table} after {elapsed:?} ({attempts} attempts)")]
    TimeoutExceeded {
        table: String,
        lock_id: String,
        elapsed: Duration,
        attempts: u32,
    },

    /// Lock operation was cancelled.
    #[error("lock operation was cancelled")]
    Cancelled,

    /// Rejected configuration (empty table name, empty lock id, ...).
    #[error("invalid lock configuration: {0}")]
    InvalidConfig(String),
}

fn key_suffix(lock_id: &Option<String>) -> String {
    match lock_id {
        Some(id) => format!(" for lock {id}"),
        None => String::new(),
    }
}

/// Tag describing a [`LockError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Credentials,
    Provisioning,
    TableNotActive,
    AlreadyLocked,
    StoreFailure,
    TimeoutExceeded,
    Cancelled,
    InvalidConfig,
}

impl LockError {
    /// Returns the error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Credentials(_) => ErrorKind::Credentials,
            Self::Provisioning { .. } => ErrorKind::Provisioning,
            Self::TableNotActive { .. } => ErrorKind::TableNotActive,
            Self::AlreadyLocked { .. } => ErrorKind::AlreadyLocked,
            Self::Store { .. } => ErrorKind::StoreFailure,
            Self::TimeoutExceeded { .. } => ErrorKind::TimeoutExceeded,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Only contention is worth waiting out; everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::AlreadyLocked)
    }

    pub(crate) fn store(
        operation: Operation,
        table: &str,
        lock_id: Option<&str>,
        source: StoreError,
    ) -> Self {
        Self::Store {
            operation,
            table: table.to_string(),
            lock_id: lock_id.map(str::to_string),
            source,
        }
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
