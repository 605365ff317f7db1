//! Makes sure the lock table exists and is active.

use std::time::Duration;

use tracing::{Span, debug, info, instrument, warn};

use crate::error::{LockError, LockResult, Operation, StoreError};
use crate::record::{TableSchema, TableStatus};
use crate::traits::KeyValueStore;

/// How the provisioner treats a missing or not-yet-active table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    pub create_if_missing: bool,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            poll_interval: Duration::from_secs(2),
            max_polls: 30,
        }
    }
}

/// Ensures `table` exists and is active, creating it when allowed.
///
/// An already active table costs a single describe call. A concurrent
/// creator winning the race is not an error: we just wait for the table
/// like they do.
///
/// # Errors
///
/// * `Provisioning` - table missing and `create_if_missing` is off
/// * `TableNotActive` - not active after `max_polls` checks
/// * `Store` - any other store failure
#[instrument(skip(store, settings), fields(lock.table = %table, create_if_missing = settings.create_if_missing, created = tracing::field::Empty))]
pub async fn ensure_table<S: KeyValueStore>(
    store: &S,
    table: &str,
    settings: &ProvisionSettings,
) -> LockResult<()> {
    let status = match store.describe_table(table).await {
        Ok(TableStatus::Active) => {
            debug!("lock table is active");
            return Ok(());
        }
        Ok(status) => status,
        Err(StoreError::TableNotFound) => {
            if !settings.create_if_missing {
                return Err(LockError::Provisioning {
                    table: table.to_string(),
                    reason: "table does not exist and table creation is disabled".to_string(),
                });
            }
            create_table(store, table).await?;
            TableStatus::Creating
        }
        Err(source) => {
            return Err(LockError::store(Operation::DescribeTable, table, None, source));
        }
    };

    wait_until_active(store, table, status, settings).await
}

async fn create_table<S: KeyValueStore>(store: &S, table: &str) -> LockResult<()> {
    info!("lock table does not exist, creating it");
    match store.create_table(&TableSchema::lock_table(table)).await {
        Ok(()) => {
            Span::current().record("created", true);
            Ok(())
        }
        Err(StoreError::TableInUse) => {
            debug!("lock table is already being created by someone else");
            Span::current().record("created", false);
            Ok(())
        }
        Err(source) => Err(LockError::store(Operation::CreateTable, table, None, source)),
    }
}

async fn wait_until_active<S: KeyValueStore>(
    store: &S,
    table: &str,
    mut last_status: TableStatus,
    settings: &ProvisionSettings,
) -> LockResult<()> {
    for attempt in 1..=settings.max_polls {
        debug!(attempt, status = %last_status, "waiting for lock table to become active");
        tokio::time::sleep(settings.poll_interval).await;

        match store.describe_table(table).await {
            Ok(TableStatus::Active) => {
                info!(attempt, "lock table is active");
                return Ok(());
            }
            Ok(status) => last_status = status,
            // Freshly created tables can take a moment to show up
            Err(StoreError::TableNotFound) => last_status = TableStatus::Creating,
            Err(source) => {
                return Err(LockError::store(Operation::DescribeTable, table, None, source));
            }
        }
    }

    warn!(max_polls = settings.max_polls, status = %last_status, "lock table never became active");
    Err(LockError::TableNotActive {
        table: table.to_string(),
        attempts: settings.max_polls,
        last_status,
    })
}
