//! Core domain types for s3stat
//!
//! This module contains the fundamental types used throughout the s3stat
//! library: account identifiers, storage tiers, and the bucket/object records
//! produced by the inventory scan and consumed by the aggregator.

use crate::error::S3statError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Region assumed when GetBucketLocation returns no constraint.
///
/// The listing API reports buckets in the original S3 region with a nil
/// location constraint; this is a quirk of the API, not an error.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Strongly-typed account identifier
///
/// An account is addressed by its profile name in the AWS credentials file.
///
/// # Examples
/// ```
/// use s3stat::types::AccountId;
///
/// let account = AccountId::new("default");
/// assert_eq!(account.as_str(), "default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId from any string-like type
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Storage tier (billing class) of an object
///
/// Covers the classes the pricing table knows about; anything else the
/// service reports is preserved as `Other` and surfaces as an
/// `UnsupportedStorageClass` error at pricing time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageTier {
    Standard,
    ReducedRedundancy,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    Glacier,
    DeepArchive,
    Other(String),
}

impl StorageTier {
    /// Parse the storage class reported by the service.
    ///
    /// `None` means the service omitted the field, which the listing API does
    /// for standard-tier objects.
    pub fn from_api(value: Option<&str>) -> Self {
        match value {
            None => Self::Standard,
            Some(s) => match s {
                "STANDARD" => Self::Standard,
                "REDUCED_REDUNDANCY" => Self::ReducedRedundancy,
                "STANDARD_IA" => Self::StandardIa,
                "ONEZONE_IA" => Self::OnezoneIa,
                "INTELLIGENT_TIERING" => Self::IntelligentTiering,
                "GLACIER" => Self::Glacier,
                "DEEP_ARCHIVE" => Self::DeepArchive,
                other => Self::Other(other.to_string()),
            },
        }
    }

    /// The service-side identifier for this tier
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "STANDARD",
            Self::ReducedRedundancy => "REDUCED_REDUNDANCY",
            Self::StandardIa => "STANDARD_IA",
            Self::OnezoneIa => "ONEZONE_IA",
            Self::IntelligentTiering => "INTELLIGENT_TIERING",
            Self::Glacier => "GLACIER",
            Self::DeepArchive => "DEEP_ARCHIVE",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Details of one S3 object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    /// Owning bucket name
    pub bucket: String,
    /// Object key, unique within the bucket
    pub key: String,
    /// Size in bytes; zero-size keys are folder placeholders
    pub size: u64,
    /// Last-modified timestamp
    pub last_modified: DateTime<Utc>,
    /// Storage tier the object is billed under
    pub storage_tier: StorageTier,
    /// Whether server-side encryption is enabled
    pub encrypted: bool,
    /// Encryption algorithm when encrypted (e.g. "AES256", "aws:kms")
    pub encryption_type: Option<String>,
}

impl Object {
    /// Folder placeholders don't count as files
    pub fn is_file(&self) -> bool {
        self.size > 0
    }
}

/// A per-object metadata fetch that failed
///
/// Captured alongside successful objects; never aborts the bucket scan.
#[derive(Debug)]
pub struct ErrObject {
    /// Owning bucket name
    pub bucket: String,
    /// Object key whose metadata fetch failed
    pub key: String,
    /// The captured error
    pub error: S3statError,
}

/// A bucket and its scanned contents
///
/// Created by the bucket enumerator, populated by the object enumerator and
/// consumed read-only by the aggregator.
///
/// Invariant: when `error` is set, `objects` and `err_objects` reflect only a
/// partial or empty scan — an empty object list must not be read as "the
/// bucket is empty".
#[derive(Debug)]
pub struct Bucket {
    /// Account that owns the bucket
    pub owner: AccountId,
    /// Bucket name, globally unique within the service
    pub name: String,
    /// Bucket creation timestamp
    pub created: DateTime<Utc>,
    /// Resolved region code
    pub region: String,
    /// Scanned objects
    pub objects: Vec<Object>,
    /// Enumeration error, if the region lookup or object listing failed
    pub error: Option<S3statError>,
    /// Objects whose metadata fetch failed
    pub err_objects: Vec<ErrObject>,
}

impl Bucket {
    /// Create an empty bucket record for the given owner
    pub fn new(owner: AccountId, name: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            owner,
            name: name.into(),
            created,
            region: String::new(),
            objects: Vec::new(),
            error: None,
            err_objects: Vec::new(),
        }
    }

    /// Objects with server-side encryption enabled
    pub fn encrypted_objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(|o| o.encrypted)
    }
}
