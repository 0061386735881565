//! Object store access for S3 and local filesystem buckets.
//!
//! The bucket to read from is only known once an event arrives, so stores are
//! resolved per bucket through [`StoreResolver`] instead of being built once.

use crate::config::StorageConfig;
use anyhow::Result;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    RetryConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A store scoped to one bucket.
#[derive(Debug, Clone)]
pub struct BucketStore {
    pub store: Arc<dyn ObjectStore>,

    /// Whether the backend can persist object attributes such as content type.
    /// `LocalFileSystem` rejects puts that carry attributes.
    pub supports_attributes: bool,
}

impl BucketStore {
    pub fn new(store: Arc<dyn ObjectStore>, supports_attributes: bool) -> Self {
        Self {
            store,
            supports_attributes,
        }
    }

    /// Read a whole object.
    pub async fn get(&self, key: &str) -> object_store::Result<Bytes> {
        let path = parse_key(key)?;
        self.store.get(&path).await?.bytes().await
    }

    /// Write a whole object, tagging it with `content_type` where supported.
    pub async fn put(&self, key: &str, body: Vec<u8>, content_type: &'static str) -> object_store::Result<()> {
        let path = parse_key(key)?;

        let mut attributes = Attributes::new();
        if self.supports_attributes {
            attributes.insert(Attribute::ContentType, content_type.into());
        }
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store.put_opts(&path, PutPayload::from(body), opts).await?;
        Ok(())
    }
}

/// Parse an object key without re-encoding it.
pub fn parse_key(key: &str) -> object_store::Result<Path> {
    Ok(Path::parse(key)?)
}

/// Resolves bucket names to stores.
pub trait StoreResolver: Send + Sync {
    fn resolve(&self, bucket: &str) -> object_store::Result<BucketStore>;
}

/// Create client options for S3 access.
///
/// Only connection establishment is bounded; request duration is left to the
/// host's invocation deadline.
fn create_client_options() -> ClientOptions {
    ClientOptions::new()
        .with_connect_timeout(Duration::from_secs(5))
        .with_pool_idle_timeout(Duration::from_secs(90))
}

/// Create retry configuration for transient S3 failures.
fn create_retry_config() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        backoff: object_store::BackoffConfig {
            init_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            base: 2.0,
        },
        retry_timeout: Duration::from_secs(30),
    }
}

/// S3 buckets with credentials from the environment.
///
/// Credentials and region are loaded from (in order):
/// - Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION)
/// - Container / instance role credentials
#[derive(Debug, Clone, Default)]
pub struct S3Stores {
    region: Option<String>,
    endpoint_url: Option<String>,
}

impl S3Stores {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
        }
    }
}

impl StoreResolver for S3Stores {
    fn resolve(&self, bucket: &str) -> object_store::Result<BucketStore> {
        tracing::debug!("Creating S3 client for bucket: {}", bucket);

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_client_options(create_client_options())
            .with_retry(create_retry_config());

        if let Some(region) = &self.region {
            builder = builder.with_region(region);
        }

        builder = match &self.endpoint_url {
            Some(endpoint) => builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"))
                .with_virtual_hosted_style_request(false),
            None => builder.with_virtual_hosted_style_request(true),
        };

        Ok(BucketStore::new(Arc::new(builder.build()?), true))
    }
}

/// Buckets as subdirectories of a local root.
#[derive(Debug, Clone)]
pub struct LocalStores {
    root: PathBuf,
}

impl LocalStores {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StoreResolver for LocalStores {
    fn resolve(&self, bucket: &str) -> object_store::Result<BucketStore> {
        if bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(object_store::Error::Generic {
                store: "LocalFileSystem",
                source: format!("invalid bucket name '{}'", bucket).into(),
            });
        }

        let path = self.root.join(bucket);
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| object_store::Error::Generic {
                store: "LocalFileSystem",
                source: Box::new(e),
            })?;
        }

        tracing::debug!("Using LocalFileSystem store at: {}", path.display());
        Ok(BucketStore::new(Arc::new(LocalFileSystem::new_with_prefix(path)?), false))
    }
}

/// Create the store resolver selected by the configuration.
/// Uses local directories if `local_root` is set, otherwise S3.
pub fn create_store_resolver(config: &StorageConfig) -> Result<Arc<dyn StoreResolver>> {
    match &config.local_root {
        Some(root) => {
            tracing::info!("Resolving buckets under local root: {}", root);
            Ok(Arc::new(LocalStores::new(root)))
        }
        None => Ok(Arc::new(S3Stores::new(config))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[test]
    fn test_s3_resolver_builds_store() {
        let resolver = S3Stores::new(&StorageConfig {
            local_root: None,
            region: Some("us-east-1".to_string()),
            endpoint_url: None,
        });
        let store = resolver.resolve("test-bucket").unwrap();
        assert!(store.supports_attributes);
    }

    #[test]
    fn test_s3_resolver_custom_endpoint() {
        let resolver = S3Stores::new(&StorageConfig {
            local_root: None,
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
        });
        assert!(resolver.resolve("test-bucket").is_ok());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("orders/123-4.json").unwrap().as_ref(), "orders/123-4.json");
        assert_eq!(parse_key("inbound/850 test.edi").unwrap().as_ref(), "inbound/850 test.edi");
        assert!(parse_key("a//b").is_err());
        assert!(parse_key("a/../b").is_err());
    }

    #[tokio::test]
    async fn test_local_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = LocalStores::new(dir.path());

        let store = resolver.resolve("bucket").unwrap();
        assert!(!store.supports_attributes);

        store
            .put("orders/1-2.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert!(dir.path().join("bucket/orders/1-2.json").exists());

        let bytes = store.get("orders/1-2.json").await.unwrap();
        assert_eq!(bytes.as_ref(), b"{}");
    }

    #[test]
    fn test_local_rejects_bucket_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = LocalStores::new(dir.path());
        assert!(resolver.resolve("..").is_err());
        assert!(resolver.resolve("a/b").is_err());
    }

    #[tokio::test]
    async fn test_put_sets_content_type() {
        let store = BucketStore::new(Arc::new(InMemory::new()), true);
        store
            .put("orders/1-2.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();

        let path = parse_key("orders/1-2.json").unwrap();
        let result = store.store.get(&path).await.unwrap();
        let content_type: Option<&str> = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref());
        assert_eq!(content_type, Some("application/json"));
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let store = BucketStore::new(Arc::new(InMemory::new()), true);
        let err = store.get("missing.edi").await.unwrap_err();
        assert!(matches!(err, object_store::Error::NotFound { .. }));
    }

    #[test]
    fn test_create_store_resolver() {
        let config = StorageConfig {
            local_root: Some(std::env::temp_dir().display().to_string()),
            region: None,
            endpoint_url: None,
        };
        assert!(create_store_resolver(&config).is_ok());
    }
}
