use std::sync::Arc;
use std::time::Duration;

use crate::{
    adapters::outbound::storage::{ConnectError, InMemoryBackend, S3Backend},
    domain::models::{StoreConnection, DEFAULT_REGION},
    ports::storage::StoreBackend,
    services::{BucketServiceImpl, DeletionServiceImpl, ObjectServiceImpl, DEFAULT_BUCKET_TIMEOUT},
};

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub bucket_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::InMemory,
            bucket_timeout: DEFAULT_BUCKET_TIMEOUT,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    S3(StoreConnection),
}

/// Application services container. Every service shares one store handle.
#[derive(Clone)]
pub struct AppServices {
    pub backend: Arc<dyn StoreBackend>,
    pub bucket_service: BucketServiceImpl,
    pub object_service: ObjectServiceImpl,
    pub deletion_service: DeletionServiceImpl,
}

/// Build the shared store handle. Failure here is fatal for the caller.
pub fn connect(connection: StoreConnection) -> Result<Arc<dyn StoreBackend>, ConnectError> {
    Ok(Arc::new(S3Backend::connect(connection)?))
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    /// Deadline for bucket existence and creation calls
    pub fn with_bucket_timeout(mut self, timeout: Duration) -> Self {
        self.config.bucket_timeout = timeout;
        self
    }

    /// Build the store handle described by the configuration
    pub fn build_backend(&self) -> Result<Arc<dyn StoreBackend>, AppError> {
        match &self.config.storage_backend {
            StorageBackend::InMemory => Ok(Arc::new(InMemoryBackend::new())),
            StorageBackend::S3(connection) => Ok(connect(connection.clone())?),
        }
    }

    /// Build the complete application with services
    pub fn build(self) -> Result<AppServices, AppError> {
        let backend = self.build_backend()?;
        Ok(Self::with_backend(backend, self.config.bucket_timeout))
    }

    /// Wire services around an existing handle, e.g. a test double
    pub fn with_backend(backend: Arc<dyn StoreBackend>, bucket_timeout: Duration) -> AppServices {
        AppServices {
            bucket_service: BucketServiceImpl::new(backend.clone()).with_timeout(bucket_timeout),
            object_service: ObjectServiceImpl::new(backend.clone()),
            deletion_service: DeletionServiceImpl::new(backend.clone()),
            backend,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {0}")]
    Connect(#[from] ConnectError),
}

/// Create an in-memory application for testing and development
pub fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
}

/// Create an application backed by an S3-compatible store
pub fn create_s3_app(connection: StoreConnection) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::S3(connection))
        .build()
}

/// Create application from environment variables
pub fn create_app_from_env() -> Result<AppServices, AppError> {
    let config = config_from_vars(|name| std::env::var(name).ok())?;
    AppBuilder::new().with_config(config).build()
}

/// Read the application configuration through `var`.
///
/// `STORAGE_BACKEND` selects `s3` (alias `minio`) or the in-memory default.
fn config_from_vars<F>(var: F) -> Result<AppConfig, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let storage_backend = match var("STORAGE_BACKEND").as_deref() {
        Some("s3") | Some("minio") => {
            let endpoint = var("S3_ENDPOINT").ok_or_else(|| AppError::Configuration {
                message: "S3_ENDPOINT environment variable required".to_string(),
            })?;
            // Empty credentials are passed through; the store rejects them
            let access_key = var("S3_ACCESS_KEY").unwrap_or_default();
            let secret_key = var("S3_SECRET_KEY").unwrap_or_default();
            let region = var("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
            let use_tls = var("MINIO_USE_SSL")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false);

            StorageBackend::S3(
                StoreConnection::new(endpoint, access_key, secret_key)
                    .with_tls(use_tls)
                    .with_region(region),
            )
        }
        Some("memory") | Some("in-memory") | None => StorageBackend::InMemory,
        Some(other) => {
            return Err(AppError::Configuration {
                message: format!("Unknown STORAGE_BACKEND '{}'", other),
            })
        }
    };

    let bucket_timeout = match var("BUCKET_TIMEOUT_SECS") {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| AppError::Configuration {
                message: format!("BUCKET_TIMEOUT_SECS must be whole seconds, got '{}'", raw),
            })?,
        None => DEFAULT_BUCKET_TIMEOUT,
    };

    Ok(AppConfig {
        storage_backend,
        bucket_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::BucketName;
    use crate::ports::services::BucketService;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn test_create_in_memory_app() {
        let app = create_in_memory_app().unwrap();
        let bucket = BucketName::new("scratch").unwrap();

        app.bucket_service.ensure_bucket(&bucket).await.unwrap();
        assert!(app.backend.bucket_exists(&bucket).await.unwrap());
    }

    #[test]
    fn test_bad_endpoint_fails_to_build() {
        let result = create_s3_app(StoreConnection::new("", "ak", "sk"));
        assert!(matches!(result, Err(AppError::Connect(_))));
    }

    #[test]
    fn test_config_defaults_to_in_memory() {
        let config = config_from_vars(vars(&[])).unwrap();
        assert!(matches!(config.storage_backend, StorageBackend::InMemory));
        assert_eq!(config.bucket_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_for_minio() {
        let config = config_from_vars(vars(&[
            ("STORAGE_BACKEND", "minio"),
            ("S3_ENDPOINT", "play.min.io"),
            ("S3_ACCESS_KEY", "minioadmin"),
            ("MINIO_USE_SSL", "true"),
            ("BUCKET_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        match config.storage_backend {
            StorageBackend::S3(connection) => {
                assert_eq!(connection.endpoint_url(), "https://play.min.io");
                assert_eq!(connection.access_key, "minioadmin");
                assert_eq!(connection.secret_key, "");
                assert_eq!(connection.region, DEFAULT_REGION);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        assert_eq!(config.bucket_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_errors() {
        assert!(config_from_vars(vars(&[("STORAGE_BACKEND", "s3")])).is_err());
        assert!(config_from_vars(vars(&[("STORAGE_BACKEND", "ftp")])).is_err());
        assert!(config_from_vars(vars(&[("BUCKET_TIMEOUT_SECS", "soon")])).is_err());
    }
}
