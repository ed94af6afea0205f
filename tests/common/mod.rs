//! Common test utilities and helpers for s3stat tests
//!
//! Provides in-memory fakes for the storage and pricing seams plus builders
//! for scripted account layouts, so integration tests exercise the full
//! collect → aggregate → render pipeline without touching AWS.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use s3stat::error::{Result, S3statError};
use s3stat::pricing::{PriceCatalog, PricingFilters};
use s3stat::storage::{BucketEntry, HeadMeta, SessionProvider, StorageClient};
use s3stat::types::AccountId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A scripted object: key, size, storage class and optional failure
#[derive(Clone)]
pub struct FakeObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub storage_class: Option<String>,
    pub encryption: Option<String>,
    pub head_fails: bool,
}

impl FakeObject {
    pub fn new(key: &str, size: u64) -> Self {
        Self {
            key: key.to_string(),
            size,
            last_modified: default_timestamp(),
            storage_class: None,
            encryption: None,
            head_fails: false,
        }
    }

    pub fn with_modified(mut self, ts: DateTime<Utc>) -> Self {
        self.last_modified = ts;
        self
    }

    pub fn with_storage_class(mut self, class: &str) -> Self {
        self.storage_class = Some(class.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn with_encryption(mut self, algorithm: &str) -> Self {
        self.encryption = Some(algorithm.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.head_fails = true;
        self
    }
}

/// A scripted bucket with its region and objects
#[derive(Clone)]
pub struct FakeBucket {
    pub name: String,
    pub created: DateTime<Utc>,
    pub region: Option<String>,
    pub objects: Vec<FakeObject>,
}

impl FakeBucket {
    pub fn new(name: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            created: default_timestamp(),
            region: Some(region.to_string()),
            objects: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: FakeObject) -> Self {
        self.objects.push(object);
        self
    }
}

/// In-memory storage client serving scripted buckets
pub struct FakeStorageClient {
    buckets: Vec<FakeBucket>,
}

#[async_trait]
impl StorageClient for FakeStorageClient {
    async fn list_buckets(&self) -> Result<Vec<BucketEntry>> {
        Ok(self
            .buckets
            .iter()
            .map(|b| BucketEntry {
                name: b.name.clone(),
                created: b.created,
            })
            .collect())
    }

    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        let bucket = self
            .buckets
            .iter()
            .find(|b| b.name == bucket)
            .ok_or_else(|| S3statError::Storage(format!("no such bucket: {bucket}")))?;
        Ok(bucket.region.clone())
    }

    async fn list_object_keys(&self, bucket: &str, _region: &str) -> Result<Vec<String>> {
        let bucket = self
            .buckets
            .iter()
            .find(|b| b.name == bucket)
            .ok_or_else(|| S3statError::Storage(format!("no such bucket: {bucket}")))?;
        Ok(bucket.objects.iter().map(|o| o.key.clone()).collect())
    }

    async fn head_object(&self, bucket: &str, key: &str, _region: &str) -> Result<HeadMeta> {
        let object = self
            .buckets
            .iter()
            .find(|b| b.name == bucket)
            .and_then(|b| b.objects.iter().find(|o| o.key == key))
            .ok_or_else(|| S3statError::Storage(format!("no such object: {key}")))?;
        if object.head_fails {
            return Err(S3statError::Storage(format!("access denied: {key}")));
        }
        Ok(HeadMeta {
            size: object.size,
            last_modified: Some(object.last_modified),
            storage_class: object.storage_class.clone(),
            encryption: object.encryption.clone(),
        })
    }
}

/// Session provider mapping account names to scripted storage clients
#[derive(Default)]
pub struct FakeSessionProvider {
    accounts: HashMap<String, Arc<FakeStorageClient>>,
}

impl FakeSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an account and its buckets; unknown accounts fail to connect
    pub fn with_account(mut self, account: &str, buckets: Vec<FakeBucket>) -> Self {
        self.accounts
            .insert(account.to_string(), Arc::new(FakeStorageClient { buckets }));
        self
    }
}

#[async_trait]
impl SessionProvider for FakeSessionProvider {
    async fn connect(&self, account: &AccountId) -> Result<Arc<dyn StorageClient>> {
        match self.accounts.get(account.as_str()) {
            Some(client) => Ok(client.clone() as Arc<dyn StorageClient>),
            None => Err(S3statError::Session {
                account: account.to_string(),
                message: "profile not found in credentials file".to_string(),
            }),
        }
    }
}

/// Price catalog answering every filter with one flat price, counting calls
pub struct CountingCatalog {
    pub price: f64,
    pub calls: AtomicUsize,
}

impl CountingCatalog {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceCatalog for CountingCatalog {
    async fn unit_price(&self, _filters: &PricingFilters) -> Result<Option<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.price))
    }
}

pub fn default_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}
