//! One-call lock operations driven by [`LockOptions`].
//!
//! Each call connects through a [`StoreConnector`], so nothing is cached
//! between calls and every check is a live round trip.

use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};

use futures::FutureExt;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::error::{LockError, LockResult};
use crate::lock::release;
use crate::options::LockOptions;
use crate::provision::ensure_table;
use crate::retry::acquire_with_retry;
use crate::status::{LockStatus, get_status};
use crate::traits::StoreConnector;

/// Acquires the lock described by `options`, provisioning the table first.
#[instrument(skip_all, fields(lock.id = %options.lock_id, lock.table = %options.table_name, region = %options.region))]
pub async fn acquire_lock<C: StoreConnector>(connector: &C, options: &LockOptions) -> LockResult<()> {
    acquire(connector, options, None).await
}

/// Like [`acquire_lock`], aborting the wait when `cancel` turns `true`.
#[instrument(skip_all, fields(lock.id = %options.lock_id, lock.table = %options.table_name, region = %options.region))]
pub async fn acquire_lock_with_cancel<C: StoreConnector>(
    connector: &C,
    options: &LockOptions,
    cancel: watch::Receiver<bool>,
) -> LockResult<()> {
    acquire(connector, options, Some(&cancel)).await
}

async fn acquire<C: StoreConnector>(
    connector: &C,
    options: &LockOptions,
    cancel: Option<&watch::Receiver<bool>>,
) -> LockResult<()> {
    options.validate()?;
    info!(
        max_retries = options.max_retries,
        interval = ?options.retry_interval,
        "attempting to acquire lock"
    );

    let store = connect(connector, options).await?;
    ensure_table(&store, &options.table_name, &options.provision_settings()).await?;
    acquire_with_retry(
        &store,
        &options.table_name,
        &options.lock_id,
        &options.retry_policy(),
        cancel,
    )
    .await
}

/// Releases the lock described by `options`.
///
/// Always idempotent. The status read beforehand is only informational: if
/// it fails, the delete is still attempted.
#[instrument(skip_all, fields(lock.id = %options.lock_id, lock.table = %options.table_name, region = %options.region))]
pub async fn release_lock<C: StoreConnector>(connector: &C, options: &LockOptions) -> LockResult<()> {
    options.validate()?;
    let store = connect(connector, options).await?;

    match get_status(&store, &options.table_name, &options.lock_id).await {
        Ok(LockStatus { held: false, .. }) => info!("lock is not held, releasing anyway"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not read lock status before release"),
    }

    release(&store, &options.table_name, &options.lock_id).await
}

/// Reads whether the lock described by `options` is held.
#[instrument(skip_all, fields(lock.id = %options.lock_id, lock.table = %options.table_name, region = %options.region))]
pub async fn get_lock_status<C: StoreConnector>(connector: &C, options: &LockOptions) -> LockResult<LockStatus> {
    options.validate()?;
    let store = connect(connector, options).await?;
    get_status(&store, &options.table_name, &options.lock_id).await
}

/// Acquires the lock, runs `action`, and releases the lock whatever the
/// action returned.
///
/// The action's error takes precedence. A release failure is returned only
/// when the action succeeded; otherwise it is logged. If the action panics,
/// the lock is released before the panic resumes.
pub async fn with_lock<C, F, Fut, T, E>(connector: &C, options: &LockOptions, action: F) -> Result<T, E>
where
    C: StoreConnector,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<LockError>,
{
    acquire_lock(connector, options).await?;

    let outcome = AssertUnwindSafe(async move { action().await }).catch_unwind().await;
    let released = release_lock(connector, options).await;

    let result = match outcome {
        Ok(result) => result,
        Err(panic) => {
            if let Err(release_err) = released {
                error!(lock.id = %options.lock_id, error = %release_err, "failed to release lock after panic");
            }
            resume_unwind(panic);
        }
    };

    match (result, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err.into()),
        (Err(action_err), Ok(())) => Err(action_err),
        (Err(action_err), Err(release_err)) => {
            error!(lock.id = %options.lock_id, error = %release_err, "failed to release lock");
            Err(action_err)
        }
    }
}

async fn connect<C: StoreConnector>(connector: &C, options: &LockOptions) -> LockResult<C::Store> {
    connector
        .connect(&options.region, options.endpoint.as_deref())
        .await
        .inspect_err(|e| error!(error = %e, "error connecting to lock store"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::error::ErrorKind;
    use crate::memory::{InMemoryStore, MemoryConnector};

    fn options(lock_id: &str) -> LockOptions {
        LockOptions::new(lock_id)
            .table_name("locks")
            .max_retries(1)
            .retry_interval(Duration::from_millis(10))
    }

    fn connector() -> MemoryConnector {
        MemoryConnector::new(Arc::new(InMemoryStore::with_active_table("locks")))
    }

    #[tokio::test]
    async fn test_acquire_status_release() {
        let connector = connector();
        let options = options("deploy");

        acquire_lock(&connector, &options).await.unwrap();
        assert!(get_lock_status(&connector, &options).await.unwrap().held);

        release_lock(&connector, &options).await.unwrap();
        assert!(!get_lock_status(&connector, &options).await.unwrap().held);

        // Releasing again is still fine
        release_lock(&connector, &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_options_make_no_store_calls() {
        let connector = connector();

        let err = acquire_lock(&connector, &options("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(connector.store().describe_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_table_without_auto_create() {
        let connector = MemoryConnector::default();

        let err = acquire_lock(&connector, &options("deploy")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provisioning);
    }

    #[tokio::test]
    async fn test_with_lock_releases_after_success() {
        let connector = connector();
        let options = options("deploy");

        let value = with_lock(&connector, &options, || async { Ok::<_, LockError>(42) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert!(!get_lock_status(&connector, &options).await.unwrap().held);
    }

    #[tokio::test]
    async fn test_with_lock_releases_after_failure() {
        #[derive(Debug)]
        enum JobError {
            Lock(LockError),
            Failed,
        }

        impl From<LockError> for JobError {
            fn from(e: LockError) -> Self {
                Self::Lock(e)
            }
        }

        let connector = connector();
        let options = options("deploy");

        let err = with_lock(&connector, &options, || async { Err::<(), _>(JobError::Failed) })
            .await
            .unwrap_err();

        match err {
            JobError::Failed => {}
            JobError::Lock(e) => panic!("unexpected lock error: {e}"),
        }
        assert!(!get_lock_status(&connector, &options).await.unwrap().held);
    }

    #[tokio::test]
    async fn test_with_lock_does_not_run_action_when_contended() {
        let connector = connector();
        let options = options("deploy");
        acquire_lock(&connector, &options).await.unwrap();

        let ran = AtomicBool::new(false);
        let flag = &ran;
        let err = with_lock(&connector, &options, || async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, LockError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TimeoutExceeded);
        assert!(!ran.load(Ordering::SeqCst));
        // The first holder still owns the lock
        assert!(get_lock_status(&connector, &options).await.unwrap().held);
    }
}
