use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    signer::Signer,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    adapters::outbound::storage::{
        bucket::BucketRequests,
        error::{ConnectError, StoreError},
        transfer,
    },
    domain::{
        errors::StorageResult,
        models::{StoreConnection, DEFAULT_REGION},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{ObjectHead, PutOutcome, StoreBackend},
};

/// Bucket name used to validate client settings before any bucket is known
const PROBE_BUCKET: &str = "connection-probe";

/// Handle to an S3-compatible store.
///
/// `object_store` scopes each client to one bucket. A client is cached once
/// a call has shown its bucket exists; until then each call builds its own.
pub struct S3Backend {
    connection: StoreConnection,
    endpoint: String,
    buckets: BucketRequests,
    stores: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("endpoint", &self.endpoint)
            .field("region", &self.connection.region)
            .finish()
    }
}

impl S3Backend {
    /// Build the store handle. No network traffic happens here, so an
    /// unreachable store only shows up on the first operation.
    pub fn connect(connection: StoreConnection) -> Result<Self, ConnectError> {
        let mut connection = connection;
        if connection.region.trim().is_empty() {
            connection.region = DEFAULT_REGION.to_string();
        }

        let endpoint = validate_endpoint(&connection)?;

        if connection.access_key.is_empty() || connection.secret_key.is_empty() {
            warn!(
                endpoint = %endpoint,
                "connecting with empty credentials; requests will likely be rejected"
            );
        }

        build_store(&connection, &endpoint, PROBE_BUCKET)
            .map_err(|e| ConnectError::Client(e.to_string()))?;

        let buckets = BucketRequests::new(connection.region.clone())?;

        info!(
            endpoint = %endpoint,
            region = %connection.region,
            tls = !connection.allows_http(),
            "object store handle ready"
        );

        Ok(Self {
            connection,
            endpoint,
            buckets,
            stores: RwLock::new(HashMap::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn store_for(&self, bucket: &BucketName) -> Result<Arc<AmazonS3>, StoreError> {
        if let Some(store) = self.stores.read().await.get(bucket.as_str()) {
            return Ok(Arc::clone(store));
        }

        debug!(bucket = %bucket, "building store client for bucket");
        Ok(Arc::new(build_store(
            &self.connection,
            &self.endpoint,
            bucket.as_str(),
        )?))
    }

    /// Cache `store` for `bucket`, keeping any client cached first
    async fn remember(&self, bucket: &BucketName, store: &Arc<AmazonS3>) {
        self.stores
            .write()
            .await
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::clone(store));
    }
}

fn validate_endpoint(connection: &StoreConnection) -> Result<String, ConnectError> {
    let invalid = |reason: &str| ConnectError::InvalidEndpoint {
        endpoint: connection.endpoint.clone(),
        reason: reason.to_string(),
    };

    if connection.endpoint.trim().is_empty() {
        return Err(invalid("endpoint is empty"));
    }

    let endpoint = connection.endpoint_url();
    let url = reqwest::Url::parse(&endpoint).map_err(|e| invalid(&e.to_string()))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if !matches!(url.path(), "" | "/") || url.query().is_some() {
        return Err(invalid("endpoint must not include a path or query"));
    }

    Ok(endpoint)
}

fn build_store(
    connection: &StoreConnection,
    endpoint: &str,
    bucket: &str,
) -> Result<AmazonS3, object_store::Error> {
    AmazonS3Builder::new()
        .with_endpoint(endpoint)
        .with_region(&connection.region)
        .with_bucket_name(bucket)
        .with_access_key_id(&connection.access_key)
        .with_secret_access_key(&connection.secret_key)
        .with_allow_http(connection.allows_http())
        .with_virtual_hosted_style_request(false)
        .build()
}

#[async_trait]
impl StoreBackend for S3Backend {
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let exists = self.buckets.exists(store.as_ref()).await?;
            if exists {
                self.remember(bucket, &store).await;
            }
            Ok::<_, StoreError>(exists)
        }
        .await;

        result.map_err(|e| e.into_storage_error("bucket_exists", bucket, None))
    }

    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        let result = async {
            let store = self.store_for(bucket).await?;
            self.buckets.create(store.as_ref()).await?;
            self.remember(bucket, &store).await;
            Ok::<_, StoreError>(())
        }
        .await;

        result.map_err(|e| e.into_storage_error("create_bucket", bucket, None))
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PutOutcome> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let path = transfer::object_path(key)?;
            let outcome = transfer::put_bytes(store.as_ref(), &path, data, content_type).await?;
            self.remember(bucket, &store).await;
            Ok::<_, StoreError>(outcome)
        }
        .await;

        result.map_err(|e| e.into_storage_error("put_object", bucket, None))
    }

    async fn put_file(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<PutOutcome> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let object_path = transfer::object_path(key)?;
            let outcome =
                transfer::put_file(store.as_ref(), &object_path, path, content_type).await?;
            self.remember(bucket, &store).await;
            Ok::<_, StoreError>(outcome)
        }
        .await;

        result.map_err(|e| e.into_storage_error("put_file", bucket, None))
    }

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<ObjectHead> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let path = transfer::object_path(key)?;
            let head = transfer::head(store.as_ref(), &path).await?;
            self.remember(bucket, &store).await;
            Ok::<_, StoreError>(head)
        }
        .await;

        result.map_err(|e| e.into_storage_error("head_object", bucket, Some(key)))
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let path = transfer::object_path(key)?;
            transfer::delete(store.as_ref(), &path).await
        }
        .await;

        result.map_err(|e| e.into_storage_error("delete_object", bucket, Some(key)))
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let path = transfer::object_path(key)?;
            let url = store.signed_url(Method::GET, &path, expires_in).await?;
            Ok::<_, StoreError>(url.to_string())
        }
        .await;

        result.map_err(|e| e.into_storage_error("presign_get", bucket, Some(key)))
    }
}
