//! Aggregation module for summarizing scanned buckets
//!
//! Drains the shared bucket channel, applies the configured filter and folds
//! each bucket's objects into one report row: total size, file count, most
//! recent modification and estimated monthly cost. Ordering in the final
//! report is imposed here by an explicit sort, never by arrival order — the
//! channel interleaves buckets from whichever account finished first.
//!
//! Pricing happens on this path, sequentially, through the shared resolver
//! cache; a bucket that cannot be priced (unknown region or tier, pricing
//! service failure) keeps its row with the cost column degraded instead of
//! failing the report.

use crate::cost_calculator::CostCalculator;
use crate::filters::BucketFilter;
use crate::types::{AccountId, Bucket};
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// One report row: a bucket and its aggregated totals
#[derive(Debug, Clone, Serialize)]
pub struct BucketReport {
    /// Account that owns the bucket
    pub owner: AccountId,
    /// Bucket name
    pub name: String,
    /// Resolved region
    pub region: String,
    /// Bucket creation timestamp
    pub created: DateTime<Utc>,
    /// Objects with nonzero size
    pub file_count: u64,
    /// Total size in bytes, folder placeholders included
    pub total_size: u64,
    /// Most recent object modification, or bucket creation when empty
    pub last_modified: DateTime<Utc>,
    /// Estimated monthly cost in USD; `None` when the bucket is unpriceable
    pub monthly_cost: Option<f64>,
    /// Enumeration error, when the scan was partial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Objects whose metadata fetch failed
    pub failed_objects: usize,
}

/// Report-wide totals
#[derive(Debug, Default, Clone, Serialize)]
pub struct Totals {
    /// Buckets in the report
    pub buckets: usize,
    /// Files across all buckets
    pub files: u64,
    /// Bytes across all buckets
    pub size: u64,
    /// Cost across priced buckets
    pub cost: f64,
}

impl Totals {
    /// Fold report rows into totals; unpriceable rows contribute no cost
    pub fn from_reports(reports: &[BucketReport]) -> Self {
        let mut totals = Self {
            buckets: reports.len(),
            ..Self::default()
        };
        for report in reports {
            totals.files += report.file_count;
            totals.size += report.total_size;
            totals.cost += report.monthly_cost.unwrap_or(0.0);
        }
        totals
    }
}

/// Order buckets by owning account, then by name within an account.
///
/// This is the report's total order: buckets with equal owners compare by
/// name ascending, buckets with different owners by owner regardless of name.
pub fn sort_buckets(buckets: &mut [Bucket]) {
    buckets.sort_by(|a, b| compare_owner_name(&a.owner, &a.name, &b.owner, &b.name));
}

/// Re-order report rows by region first, for `--group-by-region` output
pub fn sort_reports_by_region(reports: &mut [BucketReport]) {
    reports.sort_by(|a, b| {
        a.region
            .cmp(&b.region)
            .then_with(|| compare_owner_name(&a.owner, &a.name, &b.owner, &b.name))
    });
}

fn compare_owner_name(
    owner_a: &AccountId,
    name_a: &str,
    owner_b: &AccountId,
    name_b: &str,
) -> Ordering {
    owner_a.cmp(owner_b).then_with(|| name_a.cmp(name_b))
}

/// Consumes the bucket stream and produces sorted report rows
pub struct Aggregator {
    cost_calculator: Arc<CostCalculator>,
}

impl Aggregator {
    /// Create a new Aggregator
    pub fn new(cost_calculator: Arc<CostCalculator>) -> Self {
        Self { cost_calculator }
    }

    /// Drain the bucket stream, filter, sort and summarize.
    ///
    /// Consumption starts as soon as the first producer sends, so slow
    /// accounts don't hold up buckets that already arrived.
    pub async fn aggregate<S>(&self, buckets: S, filter: &BucketFilter) -> Vec<BucketReport>
    where
        S: Stream<Item = Bucket>,
    {
        tokio::pin!(buckets);
        let mut collected = Vec::new();
        while let Some(bucket) = buckets.next().await {
            if filter.matches(&bucket) {
                collected.push(bucket);
            } else {
                debug!(bucket = %bucket.name, "filtered out");
            }
        }

        sort_buckets(&mut collected);

        let mut reports = Vec::with_capacity(collected.len());
        for bucket in &collected {
            reports.push(self.summarize(bucket).await);
        }
        reports
    }

    /// Fold one bucket into its report row
    pub async fn summarize(&self, bucket: &Bucket) -> BucketReport {
        let total_size = bucket.objects.iter().map(|o| o.size).sum();
        let file_count = bucket.objects.iter().filter(|o| o.is_file()).count() as u64;
        let last_modified = bucket
            .objects
            .iter()
            .map(|o| o.last_modified)
            .max()
            .unwrap_or(bucket.created);

        let monthly_cost = match self.cost_calculator.bucket_monthly_cost(bucket).await {
            Ok(cost) => Some(cost),
            Err(e) => {
                warn!(bucket = %bucket.name, error = %e, "could not price bucket, omitting cost");
                None
            }
        };

        BucketReport {
            owner: bucket.owner.clone(),
            name: bucket.name.clone(),
            region: bucket.region.clone(),
            created: bucket.created,
            file_count,
            total_size,
            last_modified,
            monthly_cost,
            error: bucket.error.as_ref().map(|e| e.to_string()),
            failed_objects: bucket.err_objects.len(),
        }
    }
}
