//! Convenience prelude for key-value store lock types.

pub use crate::error::{ErrorKind, LockError, LockResult, StoreError};
pub use crate::traits::{
    DistributedLock, KeyValueStore, LockHandle, LockProvider, LockProviderExt, StoreConnector,
};
