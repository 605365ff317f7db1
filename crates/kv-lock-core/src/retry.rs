//! Bounded waiting for a contended lock.
//!
//! Waiters busy-poll the store: there is no queue and no ordering between
//! concurrent waiters, so under heavy contention one waiter may keep losing
//! to newcomers until its budget runs out.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{Span, debug, info, instrument, warn};

use crate::error::{LockError, LockResult};
use crate::lock::try_acquire;
use crate::traits::KeyValueStore;

/// How long and how often to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleeps allowed between attempts; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Pause between attempts.
    pub interval: Duration,
    /// Optional wall-clock cap. Sleeps are clamped so the loop never waits
    /// past it.
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
            deadline: None,
        }
    }

    /// A policy bounded only by wall-clock time.
    pub fn until(deadline: Duration, interval: Duration) -> Self {
        Self {
            max_retries: u32::MAX,
            interval,
            deadline: Some(deadline),
        }
    }

    /// Worst-case time spent sleeping, ignoring store latency.
    pub fn budget(&self) -> Duration {
        let by_count = self.interval.saturating_mul(self.max_retries);
        match self.deadline {
            Some(deadline) => by_count.min(deadline),
            None => by_count,
        }
    }
}

/// Result of [`retry_while_contended`].
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Completed(T),
    Exhausted { attempts: u32, elapsed: Duration },
}

/// Runs `attempt` until it completes, the budget is spent, or it fails fatally.
///
/// `attempt` receives the 1-based attempt number and returns:
///
/// * `Ok(Some(value))` - done
/// * `Ok(None)` or a retryable error - contended, sleep and try again
/// * any other error - returned at once, without sleeping
pub async fn retry_while_contended<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: Option<&watch::Receiver<bool>>,
    description: &str,
    mut attempt: F,
) -> LockResult<RetryOutcome<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = LockResult<Option<T>>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        if is_cancelled(cancel) {
            return Err(LockError::Cancelled);
        }

        attempts = attempts.saturating_add(1);
        match attempt(attempts).await {
            Ok(Some(value)) => return Ok(RetryOutcome::Completed(value)),
            Ok(None) => {}
            Err(e) if e.is_retryable() => {
                debug!(attempt = attempts, error = %e, "{description} contended");
            }
            Err(e) => {
                warn!(attempt = attempts, error = %e, "{description} failed, not retrying");
                return Err(e);
            }
        }

        let elapsed = start.elapsed();
        if attempts > policy.max_retries {
            return Ok(RetryOutcome::Exhausted { attempts, elapsed });
        }

        let mut sleep_for = policy.interval;
        if let Some(deadline) = policy.deadline {
            let remaining = deadline.saturating_sub(elapsed);
            if remaining.is_zero() {
                return Ok(RetryOutcome::Exhausted { attempts, elapsed });
            }
            sleep_for = sleep_for.min(remaining);
        }

        info!(
            attempt = attempts,
            max_retries = policy.max_retries,
            "{description} unsuccessful, retrying in {sleep_for:?}"
        );
        sleep_or_cancel(sleep_for, cancel).await?;
    }
}

/// Acquires `lock_id`, retrying on contention as `policy` allows.
///
/// # Errors
///
/// * `TimeoutExceeded` - still held elsewhere when the budget ran out
/// * `Store` - first infrastructure failure, returned without retrying
/// * `Cancelled` - `cancel` flipped to `true`
#[instrument(skip(store, policy, cancel), fields(lock.table = %table, lock.id = %lock_id, max_retries = policy.max_retries, acquired = tracing::field::Empty))]
pub async fn acquire_with_retry<S: KeyValueStore>(
    store: &S,
    table: &str,
    lock_id: &str,
    policy: &RetryPolicy,
    cancel: Option<&watch::Receiver<bool>>,
) -> LockResult<()> {
    let description = format!("acquire lock {lock_id}");
    let outcome = retry_while_contended(policy, cancel, &description, move |_| async move {
        try_acquire(store, table, lock_id).await.map(Some)
    })
    .await?;

    match outcome {
        RetryOutcome::Completed(()) => {
            Span::current().record("acquired", true);
            Ok(())
        }
        RetryOutcome::Exhausted { attempts, elapsed } => {
            Span::current().record("acquired", false);
            warn!(attempts, ?elapsed, "timed out waiting for lock");
            Err(LockError::TimeoutExceeded {
                table: table.to_string(),
                lock_id: lock_id.to_string(),
                elapsed,
                attempts,
            })
        }
    }
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.is_some_and(|rx| *rx.borrow())
}

async fn sleep_or_cancel(duration: Duration, cancel: Option<&watch::Receiver<bool>>) -> LockResult<()> {
    let Some(cancel) = cancel else {
        tokio::time::sleep(duration).await;
        return Ok(());
    };

    let mut cancel = cancel.clone();
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return Err(LockError::Cancelled),
                Ok(()) => continue,
                // Sender gone: nobody can cancel any more
                Err(_) => {
                    (&mut sleep).await;
                    return Ok(());
                }
            },
        }
    }
}
