//! Tests for provider abstraction.

use std::sync::Arc;
use std::time::Duration;

use kv_lock_core::error::ErrorKind;
use kv_lock_core::memory::InMemoryStore;
use kv_lock_core::provider::KvLockProvider;
use kv_lock_core::status::get_status;
use kv_lock_core::traits::{DistributedLock, KeyValueStore, LockHandle, LockProvider, LockProviderExt};

mod common;
use common::faulty_store::FaultyStore;

async fn memory_provider(table: &str) -> KvLockProvider<InMemoryStore> {
    KvLockProvider::builder()
        .store(Arc::new(InMemoryStore::with_active_table(table)))
        .table_name(table)
        .max_retries(0)
        .build()
        .await
        .unwrap()
}

/// Tests that any provider can be used with the same code.
async fn test_provider_abstraction<P: LockProvider>(provider: &P, name: &str)
where
    P::Lock: DistributedLock,
{
    let lock = provider.create_lock(name);
    assert_eq!(lock.name(), name);

    let handle = lock.try_acquire().await.unwrap();
    assert!(handle.is_some());

    // Held until released
    assert!(lock.try_acquire().await.unwrap().is_none());

    handle.unwrap().release().await.unwrap();

    let handle2 = lock.try_acquire().await.unwrap();
    assert!(handle2.is_some());
    handle2.unwrap().release().await.unwrap();
}

/// Tests provider extension methods work with any provider.
async fn test_provider_extensions<P: LockProvider + LockProviderExt>(provider: &P, name: &str)
where
    P::Lock: DistributedLock,
{
    let handle = provider
        .acquire_lock(name, Some(Duration::from_millis(100)))
        .await;
    assert!(handle.is_ok());

    // Should be None because lock is held
    let handle2 = provider.try_acquire_lock(name).await.unwrap();
    assert!(handle2.is_none());

    handle.unwrap().release().await.unwrap();
}

#[tokio::test]
async fn test_memory_provider_abstraction() {
    let provider = memory_provider("locks").await;
    test_provider_abstraction(&provider, "test-resource").await;
}

#[tokio::test]
async fn test_memory_provider_extensions() {
    let provider = memory_provider("locks").await;
    test_provider_extensions(&provider, "test-resource").await;
}

#[tokio::test]
async fn test_provider_swappability() {
    async fn use_any_provider<P: LockProvider>(provider: &P)
    where
        P::Lock: DistributedLock,
    {
        let lock = provider.create_lock("shared-resource");
        let handle = lock.try_acquire().await.unwrap();
        assert!(handle.is_some());
        handle.unwrap().release().await.unwrap();
    }

    use_any_provider(&memory_provider("locks").await).await;

    let faulty = KvLockProvider::builder()
        .store(Arc::new(FaultyStore::new(InMemoryStore::with_active_table("locks"))))
        .table_name("locks")
        .build()
        .await
        .unwrap();
    use_any_provider(&faulty).await;
}

#[tokio::test(start_paused = true)]
async fn test_acquire_timeout_on_held_lock() {
    let provider = memory_provider("locks").await;
    let lock = provider.create_lock("busy");
    let handle = lock.acquire(None).await.unwrap();

    let err = provider
        .acquire_lock("busy", Some(Duration::from_secs(3)))
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::TimeoutExceeded);

    handle.release().await.unwrap();
}

#[tokio::test]
async fn test_store_failure_surfaces_from_try_acquire() {
    let provider = KvLockProvider::builder()
        .store(Arc::new(FaultyStore::new(InMemoryStore::with_active_table("locks"))))
        .table_name("locks")
        .build()
        .await
        .unwrap();
    provider.store().fail_puts(true);

    let err = provider.try_acquire_lock("deploy").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);
}

#[tokio::test]
async fn test_failed_release_reports_error_and_keeps_lock() {
    let provider = KvLockProvider::builder()
        .store(Arc::new(FaultyStore::new(InMemoryStore::with_active_table("locks"))))
        .table_name("locks")
        .build()
        .await
        .unwrap();

    let handle = provider.try_acquire_lock("deploy").await.unwrap().unwrap();
    provider.store().fail_deletes(true);

    let err = handle.release().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);

    let status = get_status(provider.store().as_ref(), "locks", "deploy").await.unwrap();
    assert!(status.held);

    provider.store().fail_deletes(false);
    let retry = provider.create_lock("deploy");
    assert!(retry.try_acquire().await.unwrap().is_none());
    provider.store().delete("locks", "deploy").await.unwrap();
    assert!(retry.try_acquire().await.unwrap().is_some());
}

#[tokio::test]
async fn test_dropped_handle_keeps_lock() {
    let provider = memory_provider("locks").await;

    let handle = provider.try_acquire_lock("forgotten").await.unwrap().unwrap();
    drop(handle);

    // Records never expire on their own
    let status = get_status(provider.store().as_ref(), "locks", "forgotten").await.unwrap();
    assert!(status.held);
    assert!(provider.try_acquire_lock("forgotten").await.unwrap().is_none());

    // Deleting the item by hand frees the lock
    provider.store().delete("locks", "forgotten").await.unwrap();
    assert!(provider.try_acquire_lock("forgotten").await.unwrap().is_some());
}
