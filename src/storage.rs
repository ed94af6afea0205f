//! Storage-service access
//!
//! Defines the seams the inventory scan talks through — [`SessionProvider`]
//! for per-account credential acquisition and [`StorageClient`] for the four
//! listing/metadata calls — plus their AWS implementations.
//!
//! Per-object operations must target the bucket's actual region; the AWS
//! client keeps a small map of region-scoped S3 clients derived from the
//! account's shared configuration.

use crate::error::{Result, S3statError};
use crate::types::AccountId;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, ProvideCredentials, Region};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// One bucket as returned by the bucket listing
#[derive(Debug, Clone)]
pub struct BucketEntry {
    /// Bucket name
    pub name: String,
    /// Creation timestamp
    pub created: DateTime<Utc>,
}

/// Per-object metadata from a head request
#[derive(Debug, Clone)]
pub struct HeadMeta {
    /// Object size in bytes
    pub size: u64,
    /// Last-modified timestamp
    pub last_modified: Option<DateTime<Utc>>,
    /// Storage class as reported by the service; absent for standard tier
    pub storage_class: Option<String>,
    /// Server-side encryption algorithm, when enabled
    pub encryption: Option<String>,
}

/// Seam over the storage-listing service for one account session
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List all buckets visible to the session
    async fn list_buckets(&self) -> Result<Vec<BucketEntry>>;

    /// Resolve a bucket's region; `None` means no explicit constraint
    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>>;

    /// List every object key in a bucket, in its region
    async fn list_object_keys(&self, bucket: &str, region: &str) -> Result<Vec<String>>;

    /// Fetch one object's metadata, in the bucket's region
    async fn head_object(&self, bucket: &str, key: &str, region: &str) -> Result<HeadMeta>;
}

/// Seam over session/credential acquisition
///
/// A failure here is scoped to one account; other accounts keep scanning.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn connect(&self, account: &AccountId) -> Result<Arc<dyn StorageClient>>;
}

/// Static credential pair passed on the command line
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Session provider backed by the AWS credential chain
///
/// Resolves each account as a profile in the shared credentials file, unless
/// an explicit key pair was supplied, which then applies to every account.
pub struct AwsSessionProvider {
    credentials: Option<StaticCredentials>,
    endpoint: Option<String>,
}

impl AwsSessionProvider {
    pub fn new(credentials: Option<StaticCredentials>, endpoint: Option<String>) -> Self {
        Self {
            credentials,
            endpoint,
        }
    }
}

#[async_trait]
impl SessionProvider for AwsSessionProvider {
    async fn connect(&self, account: &AccountId) -> Result<Arc<dyn StorageClient>> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(creds) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                None,
                None,
                "s3stat",
            ));
        } else {
            loader = loader.profile_name(account.as_str());
        }

        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        // The loader itself is lazy; resolve credentials now so a missing or
        // broken profile fails here, scoped to this account.
        let provider = config
            .credentials_provider()
            .ok_or_else(|| S3statError::Session {
                account: account.to_string(),
                message: "no credentials provider configured".to_string(),
            })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| S3statError::Session {
                account: account.to_string(),
                message: e.to_string(),
            })?;

        debug!(account = %account, "session established");
        Ok(Arc::new(AwsStorageClient::new(
            config,
            self.endpoint.is_some(),
        )))
    }
}

/// Storage client over the AWS S3 SDK
pub struct AwsStorageClient {
    config: aws_config::SdkConfig,
    force_path_style: bool,
    default_client: aws_sdk_s3::Client,
    regional_clients: RwLock<HashMap<String, aws_sdk_s3::Client>>,
}

impl AwsStorageClient {
    /// Build a client over the account's shared configuration.
    ///
    /// `force_path_style` keeps bucket addressing working against custom
    /// endpoints such as LocalStack.
    pub fn new(config: aws_config::SdkConfig, force_path_style: bool) -> Self {
        let default_client = Self::build_client(&config, None, force_path_style);
        Self {
            config,
            force_path_style,
            default_client,
            regional_clients: RwLock::new(HashMap::new()),
        }
    }

    fn build_client(
        config: &aws_config::SdkConfig,
        region: Option<&str>,
        force_path_style: bool,
    ) -> aws_sdk_s3::Client {
        let mut builder = aws_sdk_s3::config::Builder::from(config);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        if force_path_style {
            builder = builder.force_path_style(true);
        }
        aws_sdk_s3::Client::from_conf(builder.build())
    }

    /// Client scoped to the bucket's region, created on first use
    async fn regional(&self, region: &str) -> aws_sdk_s3::Client {
        {
            let clients = self.regional_clients.read().await;
            if let Some(client) = clients.get(region) {
                return client.clone();
            }
        }

        let client = Self::build_client(&self.config, Some(region), self.force_path_style);
        let mut clients = self.regional_clients.write().await;
        clients
            .entry(region.to_string())
            .or_insert(client)
            .clone()
    }
}

#[async_trait]
impl StorageClient for AwsStorageClient {
    async fn list_buckets(&self) -> Result<Vec<BucketEntry>> {
        let response = self
            .default_client
            .list_buckets()
            .send()
            .await
            .map_err(|e| S3statError::Storage(format!("list buckets failed: {e}")))?;

        let entries = response
            .buckets()
            .iter()
            .filter_map(|b| {
                let name = b.name()?.to_string();
                let created = smithy_to_chrono(b.creation_date()).unwrap_or(DateTime::UNIX_EPOCH);
                Some(BucketEntry { name, created })
            })
            .collect();
        Ok(entries)
    }

    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        let response = self
            .default_client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| S3statError::Storage(format!("get bucket location failed: {e}")))?;

        Ok(normalize_location(
            response.location_constraint().map(|c| c.as_str().to_string()),
        ))
    }

    async fn list_object_keys(&self, bucket: &str, region: &str) -> Result<Vec<String>> {
        let client = self.regional(region).await;
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = client.list_objects_v2().bucket(bucket);
            if let Some(ref token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| S3statError::Storage(format!("list objects failed: {e}")))?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn head_object(&self, bucket: &str, key: &str, region: &str) -> Result<HeadMeta> {
        let client = self.regional(region).await;
        let response = client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3statError::Storage(format!("head object failed: {e}")))?;

        Ok(HeadMeta {
            size: response.content_length().unwrap_or(0).max(0) as u64,
            last_modified: smithy_to_chrono(response.last_modified()),
            storage_class: response.storage_class().map(|c| c.as_str().to_string()),
            encryption: response
                .server_side_encryption()
                .map(|e| e.as_str().to_string()),
        })
    }
}

fn smithy_to_chrono(dt: Option<&aws_sdk_s3::primitives::DateTime>) -> Option<DateTime<Utc>> {
    dt.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
}

/// The location API reports the original region as a nil or empty constraint.
fn normalize_location(constraint: Option<String>) -> Option<String> {
    constraint.filter(|c| !c.is_empty())
}
