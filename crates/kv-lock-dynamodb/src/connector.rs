//! Builds DynamoDB clients for a region.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_dynamodb::Client;
use kv_lock_core::{LockError, LockResult, StoreConnector};
use tracing::{debug, instrument};

use crate::client::DynamoDbStore;

/// Connects to DynamoDB using the default AWS credential chain.
///
/// Credentials are resolved eagerly on every connect, so a missing or broken
/// credential setup fails with [`LockError::Credentials`] before any table
/// call is made.
#[derive(Debug, Clone, Default)]
pub struct DynamoDbConnector {
    base: Option<SdkConfig>,
}

impl DynamoDbConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing SDK config instead of loading the defaults.
    ///
    /// The region passed to `connect` still overrides the one in `config`.
    pub fn with_sdk_config(config: SdkConfig) -> Self {
        Self { base: Some(config) }
    }

    async fn load(&self, region: &str) -> SdkConfig {
        match &self.base {
            Some(config) => config.clone(),
            None => {
                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region.to_string()))
                    .load()
                    .await
            }
        }
    }
}

impl StoreConnector for DynamoDbConnector {
    type Store = DynamoDbStore;

    #[instrument(skip(self), fields(backend = "dynamodb"))]
    async fn connect(&self, region: &str, endpoint: Option<&str>) -> LockResult<DynamoDbStore> {
        if region.trim().is_empty() {
            return Err(LockError::InvalidConfig("region cannot be empty".to_string()));
        }

        let sdk_config = self.load(region).await;
        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| LockError::Credentials("no credentials provider configured".into()))?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| LockError::Credentials(Box::new(e)))?;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .region(Region::new(region.to_string()));
        if let Some(endpoint) = endpoint {
            debug!(endpoint, "using endpoint override");
            builder = builder.endpoint_url(endpoint);
        }

        Ok(DynamoDbStore::from_client(Client::from_conf(builder.build())))
    }
}
