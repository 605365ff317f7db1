//! DynamoDB implementation of the lock store contract.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
    TableStatus as DynamoTableStatus,
};
use kv_lock_core::record::{LOCK_ID_ATTRIBUTE, LockRecord, TableSchema, TableStatus};
use kv_lock_core::{KeyValueStore, StoreError};
use tracing::{debug, instrument};

use crate::error::{classify_create, classify_delete, classify_describe, classify_get, classify_put};
use crate::item;

/// Condition making `PutItem` an insert-if-absent.
const ABSENT_CONDITION: &str = "attribute_not_exists(LockID)";

/// Lock table access through the AWS SDK.
#[derive(Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore").finish_non_exhaustive()
    }
}

impl DynamoDbStore {
    /// Wraps an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn convert_status(status: Option<&DynamoTableStatus>) -> TableStatus {
    match status {
        Some(DynamoTableStatus::Active) => TableStatus::Active,
        Some(DynamoTableStatus::Creating) => TableStatus::Creating,
        Some(DynamoTableStatus::Updating) => TableStatus::Updating,
        Some(DynamoTableStatus::Deleting) => TableStatus::Deleting,
        Some(other) => TableStatus::Other(other.as_str().to_string()),
        None => TableStatus::Other("UNKNOWN".to_string()),
    }
}

impl KeyValueStore for DynamoDbStore {
    #[instrument(skip(self, record), fields(lock.id = %record.lock_id, backend = "dynamodb"))]
    async fn put_if_absent(&self, table: &str, record: &LockRecord) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item::to_item(record)))
            .condition_expression(ABSENT_CONDITION)
            .send()
            .await
            .map_err(|e| classify_put(e.into_service_error()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "dynamodb"))]
    async fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(item::key(key)))
            .send()
            .await
            .map_err(|e| classify_delete(e.into_service_error()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "dynamodb"))]
    async fn get_item(&self, table: &str, key: &str) -> Result<Option<LockRecord>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(item::key(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| classify_get(e.into_service_error()))?;

        Ok(output.item().and_then(item::from_item))
    }

    #[instrument(skip(self), fields(backend = "dynamodb"))]
    async fn describe_table(&self, table: &str) -> Result<TableStatus, StoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| classify_describe(e.into_service_error()))?;

        let status = convert_status(output.table().and_then(|t| t.table_status()));
        debug!(%status, "described lock table");
        Ok(status)
    }

    #[instrument(skip(self, schema), fields(lock.table = %schema.table_name, backend = "dynamodb"))]
    async fn create_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(&schema.hash_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(StoreError::service)?;
        let key = KeySchemaElement::builder()
            .attribute_name(&schema.hash_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(StoreError::service)?;

        self.client
            .create_table()
            .table_name(&schema.table_name)
            .attribute_definitions(attribute)
            .key_schema(key)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| classify_create(e.into_service_error()))?;

        debug!(hash_key = LOCK_ID_ATTRIBUTE, "requested lock table creation");
        Ok(())
    }
}
