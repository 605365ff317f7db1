//! Held-lock handle.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{instrument, warn};

use crate::error::LockResult;
use crate::lock::release;
use crate::traits::{KeyValueStore, LockHandle};

/// Handle for a held lock record.
///
/// Records never expire. Dropping the handle without calling
/// [`release`](LockHandle::release) leaves the record in the table, and the
/// lock stays held until it is deleted by hand.
pub struct KvLockHandle<S: KeyValueStore> {
    store: Arc<S>,
    table: String,
    lock_id: String,
    /// Never fires: without leases there is nothing to lose.
    #[allow(dead_code)]
    lost_sender: watch::Sender<bool>,
    lost_receiver: watch::Receiver<bool>,
    state: ReleaseState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseState {
    Held,
    Released,
    /// `release()` ran and the delete failed; already reported there.
    Failed,
}

impl<S: KeyValueStore> KvLockHandle<S> {
    pub(crate) fn new(store: Arc<S>, table: String, lock_id: String) -> Self {
        let (lost_sender, lost_receiver) = watch::channel(false);
        Self {
            store,
            table,
            lock_id,
            lost_sender,
            lost_receiver,
            state: ReleaseState::Held,
        }
    }

    pub fn lock_id(&self) -> &str {
        &self.lock_id
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl<S: KeyValueStore> LockHandle for KvLockHandle<S> {
    fn lost_token(&self) -> &watch::Receiver<bool> {
        &self.lost_receiver
    }

    #[instrument(skip(self), fields(lock.id = %self.lock_id, lock.table = %self.table, backend = "kv"))]
    async fn release(mut self) -> LockResult<()> {
        match release(self.store.as_ref(), &self.table, &self.lock_id).await {
            Ok(()) => {
                self.state = ReleaseState::Released;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to release lock; the lock stays held");
                self.state = ReleaseState::Failed;
                Err(e)
            }
        }
    }
}

impl<S: KeyValueStore> Drop for KvLockHandle<S> {
    fn drop(&mut self) {
        if self.state == ReleaseState::Held {
            warn!(
                lock.id = %self.lock_id,
                lock.table = %self.table,
                "lock handle dropped without release; the lock stays held"
            );
        }
    }
}
