//! Conversion between lock records and DynamoDB items.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use kv_lock_core::record::{ACQUIRED_AT_ATTRIBUTE, LOCK_ID_ATTRIBUTE, LockRecord};

pub fn key(lock_id: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([(
        LOCK_ID_ATTRIBUTE.to_string(),
        AttributeValue::S(lock_id.to_string()),
    )])
}

pub fn to_item(record: &LockRecord) -> HashMap<String, AttributeValue> {
    let mut item = key(&record.lock_id);
    if let Some(acquired_at) = record.acquired_at {
        item.insert(
            ACQUIRED_AT_ATTRIBUTE.to_string(),
            AttributeValue::N(acquired_at.to_string()),
        );
    }
    item
}

/// Items without a string `LockID` are not lock records.
pub fn from_item(item: &HashMap<String, AttributeValue>) -> Option<LockRecord> {
    let lock_id = item.get(LOCK_ID_ATTRIBUTE)?.as_s().ok()?;
    let acquired_at = item
        .get(ACQUIRED_AT_ATTRIBUTE)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok());

    Some(LockRecord {
        lock_id: lock_id.clone(),
        acquired_at,
    })
}
