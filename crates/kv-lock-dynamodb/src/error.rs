//! Maps DynamoDB operation errors onto [`StoreError`].

use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use kv_lock_core::StoreError;

pub fn classify_put(err: PutItemError) -> StoreError {
    match err {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        PutItemError::ResourceNotFoundException(_) => StoreError::TableNotFound,
        other => StoreError::service(other),
    }
}

pub fn classify_delete(err: DeleteItemError) -> StoreError {
    match err {
        DeleteItemError::ResourceNotFoundException(_) => StoreError::TableNotFound,
        other => StoreError::service(other),
    }
}

pub fn classify_get(err: GetItemError) -> StoreError {
    match err {
        GetItemError::ResourceNotFoundException(_) => StoreError::TableNotFound,
        other => StoreError::service(other),
    }
}

pub fn classify_describe(err: DescribeTableError) -> StoreError {
    match err {
        DescribeTableError::ResourceNotFoundException(_) => StoreError::TableNotFound,
        other => StoreError::service(other),
    }
}

pub fn classify_create(err: CreateTableError) -> StoreError {
    match err {
        CreateTableError::ResourceInUseException(_) => StoreError::TableInUse,
        other => StoreError::service(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::error::{
        ConditionalCheckFailedException, LimitExceededException, ProvisionedThroughputExceededException,
        ResourceInUseException, ResourceNotFoundException,
    };

    #[test]
    fn test_condition_failure_is_contention() {
        let err = PutItemError::ConditionalCheckFailedException(
            ConditionalCheckFailedException::builder()
                .message("The conditional request failed")
                .build(),
        );
        assert!(matches!(classify_put(err), StoreError::ConditionFailed));
    }

    #[test]
    fn test_throttling_is_a_service_error() {
        let err = PutItemError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder().build(),
        );
        assert!(matches!(classify_put(err), StoreError::Service(_)));
    }

    #[test]
    fn test_missing_table() {
        let not_found = || ResourceNotFoundException::builder().build();
        assert!(matches!(
            classify_describe(DescribeTableError::ResourceNotFoundException(not_found())),
            StoreError::TableNotFound
        ));
        assert!(matches!(
            classify_delete(DeleteItemError::ResourceNotFoundException(not_found())),
            StoreError::TableNotFound
        ));
        assert!(matches!(
            classify_get(GetItemError::ResourceNotFoundException(not_found())),
            StoreError::TableNotFound
        ));
    }

    #[test]
    fn test_create_race() {
        let err = CreateTableError::ResourceInUseException(ResourceInUseException::builder().build());
        assert!(matches!(classify_create(err), StoreError::TableInUse));

        let err = CreateTableError::LimitExceededException(LimitExceededException::builder().build());
        assert!(matches!(classify_create(err), StoreError::Service(_)));
    }
}
