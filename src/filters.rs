//! Filtering module for scanned buckets
//!
//! Narrows the report to a single bucket, a name pattern, or buckets holding
//! objects of a given storage class. All filters are optional and combine.
//!
//! # Examples
//!
//! ```
//! use s3stat::filters::BucketFilter;
//!
//! let filter = BucketFilter::new().with_pattern("prod-*".to_string());
//! ```

use crate::types::{Bucket, StorageTier};

/// Filter configuration for scanned buckets
#[derive(Debug, Default, Clone)]
pub struct BucketFilter {
    /// Exact bucket name
    pub bucket: Option<String>,
    /// Glob-style name pattern (`*` matches any run of characters)
    pub pattern: Option<String>,
    /// Keep buckets containing at least one object of this class
    pub storage_class: Option<StorageTier>,
}

impl BucketFilter {
    /// Create a filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one bucket by name
    pub fn with_bucket(mut self, bucket: String) -> Self {
        self.bucket = Some(bucket);
        self
    }

    /// Set the name pattern filter
    pub fn with_pattern(mut self, pattern: String) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Set the storage-class filter
    pub fn with_storage_class(mut self, tier: StorageTier) -> Self {
        self.storage_class = Some(tier);
        self
    }

    /// Check if a bucket passes the filter
    pub fn matches(&self, bucket: &Bucket) -> bool {
        if let Some(name) = &self.bucket {
            if &bucket.name != name {
                return false;
            }
        }

        if let Some(pattern) = &self.pattern {
            if !glob_match(pattern, &bucket.name) {
                return false;
            }
        }

        if let Some(tier) = &self.storage_class {
            if !bucket.objects.iter().any(|o| &o.storage_tier == tier) {
                return false;
            }
        }

        true
    }
}

/// Match `text` against a pattern where `*` matches any run of characters.
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');

    // Part before the first `*` anchors at the start.
    let first = parts.next().unwrap_or("");
    if !text.starts_with(first) {
        return false;
    }
    let mut rest = &text[first.len()..];

    let mut parts = parts.peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            // Last part anchors at the end.
            return part.is_empty() || rest.ends_with(part);
        }
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }

    // Pattern had no `*`: exact match required.
    rest.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, Object};
    use chrono::Utc;

    fn bucket_with_tier(name: &str, tier: StorageTier) -> Bucket {
        let mut bucket = Bucket::new(AccountId::new("default"), name, Utc::now());
        bucket.objects.push(Object {
            bucket: name.to_string(),
            key: "k".to_string(),
            size: 1,
            last_modified: Utc::now(),
            storage_tier: tier,
            encrypted: false,
            encryption_type: None,
        });
        bucket
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("prod-*", "prod-logs"));
        assert!(glob_match("*-logs", "prod-logs"));
        assert!(glob_match("prod-*-eu", "prod-logs-eu"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
        assert!(!glob_match("prod-*", "staging-logs"));
    }

    #[test]
    fn exact_bucket_filter() {
        let filter = BucketFilter::new().with_bucket("wanted".to_string());
        assert!(filter.matches(&bucket_with_tier("wanted", StorageTier::Standard)));
        assert!(!filter.matches(&bucket_with_tier("other", StorageTier::Standard)));
    }

    #[test]
    fn storage_class_filter_inspects_objects() {
        let filter = BucketFilter::new().with_storage_class(StorageTier::Glacier);
        assert!(filter.matches(&bucket_with_tier("cold", StorageTier::Glacier)));
        assert!(!filter.matches(&bucket_with_tier("hot", StorageTier::Standard)));
    }

    #[test]
    fn combined_filters_all_apply() {
        let filter = BucketFilter::new()
            .with_pattern("prod-*".to_string())
            .with_storage_class(StorageTier::Standard);
        assert!(filter.matches(&bucket_with_tier("prod-data", StorageTier::Standard)));
        assert!(!filter.matches(&bucket_with_tier("prod-data", StorageTier::Glacier)));
        assert!(!filter.matches(&bucket_with_tier("dev-data", StorageTier::Standard)));
    }
}
