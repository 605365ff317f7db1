//! Lock table schema and the records stored in it.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the partition key attribute.
pub const LOCK_ID_ATTRIBUTE: &str = "LockID";

/// Name of the informational acquisition timestamp attribute.
pub const ACQUIRED_AT_ATTRIBUTE: &str = "AcquiredAt";

/// Default lock table name.
pub const DEFAULT_TABLE_NAME: &str = "DistributedLocks";

/// A held lock as persisted in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    pub lock_id: String,
    /// Seconds since the Unix epoch. `None` for records written by other tools.
    pub acquired_at: Option<u64>,
}

impl LockRecord {
    /// Creates a record stamped with the current time.
    pub fn new(lock_id: impl Into<String>) -> Self {
        let acquired_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .ok();
        Self {
            lock_id: lock_id.into(),
            acquired_at,
        }
    }
}

/// Lifecycle state of the lock table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    Other(String),
}

impl TableStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => f.write_str("CREATING"),
            Self::Updating => f.write_str("UPDATING"),
            Self::Deleting => f.write_str("DELETING"),
            Self::Active => f.write_str("ACTIVE"),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// Schema used when the provisioner creates a lock table: a single string
/// hash key named [`LOCK_ID_ATTRIBUTE`], on-demand capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub hash_key: String,
}

impl TableSchema {
    pub fn lock_table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_key: LOCK_ID_ATTRIBUTE.to_string(),
        }
    }
}
