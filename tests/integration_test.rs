//! Integration tests for s3stat
//!
//! Exercises the full collect → aggregate → render pipeline over in-memory
//! fakes: account fan-out, per-object failure tolerance, cache-backed pricing
//! and report ordering.

mod common;

use common::{CountingCatalog, FakeBucket, FakeObject, FakeSessionProvider, default_timestamp};
use chrono::{TimeZone, Utc};
use s3stat::{
    aggregation::{Aggregator, Totals},
    cost_calculator::CostCalculator,
    filters::BucketFilter,
    inventory::AccountCollector,
    output::get_formatter,
    pricing::PricingResolver,
    types::{AccountId, StorageTier},
};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

fn aggregator_with(catalog: Arc<CountingCatalog>) -> Aggregator {
    let resolver = Arc::new(PricingResolver::new(catalog));
    Aggregator::new(Arc::new(CostCalculator::new(resolver)))
}

#[tokio::test]
async fn end_to_end_report_is_sorted_and_priced() {
    let sessions = FakeSessionProvider::new().with_account(
        "default",
        vec![
            FakeBucket::new("b-two", "us-east-1")
                .with_object(FakeObject::new("big.bin", 5_000_000_000)),
            FakeBucket::new("b-one", "us-east-1").with_object(FakeObject::new("small.txt", 100)),
        ],
    );

    let catalog = Arc::new(CountingCatalog::new(0.023));
    let aggregator = aggregator_with(catalog.clone());
    let rx = AccountCollector::new(Arc::new(sessions)).spawn(vec![AccountId::new("default")]);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &BucketFilter::new()).await;

    // Property 6: same owner orders by name ascending.
    let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["b-one", "b-two"]);

    // Property 6: 5e9 bytes of STANDARD at $0.023/GB is about $0.107.
    let cost = reports[1].monthly_cost.unwrap();
    assert!((cost - 0.1071).abs() < 0.001, "cost was {cost}");

    // Property 3: both buckets share one (region, tier) pair, so the catalog
    // was queried exactly once; the second lookup came from the cache.
    assert_eq!(catalog.call_count(), 1);
}

#[tokio::test]
async fn failed_account_does_not_block_the_other() {
    let sessions = FakeSessionProvider::new().with_account(
        "healthy",
        vec![
            FakeBucket::new("kappa", "eu-west-1").with_object(FakeObject::new("k1", 10)),
            FakeBucket::new("alpha", "eu-west-1").with_object(FakeObject::new("k2", 20)),
        ],
    );

    let aggregator = aggregator_with(Arc::new(CountingCatalog::new(0.023)));
    let collector = AccountCollector::new(Arc::new(sessions));
    let rx = collector.spawn(vec![AccountId::new("broken"), AccountId::new("healthy")]);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &BucketFilter::new()).await;

    // Property 7: the healthy account's report is complete and sorted.
    let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "kappa"]);
    assert!(reports.iter().all(|r| r.owner == AccountId::new("healthy")));
}

#[tokio::test]
async fn object_failures_stay_scoped() {
    let sessions = FakeSessionProvider::new().with_account(
        "default",
        vec![
            FakeBucket::new("partial", "us-east-1")
                .with_object(FakeObject::new("readable", 100))
                .with_object(FakeObject::new("forbidden", 50).failing())
                .with_object(FakeObject::new("also-readable", 200)),
            FakeBucket::new("pristine", "us-east-1").with_object(FakeObject::new("fine", 300)),
        ],
    );

    let aggregator = aggregator_with(Arc::new(CountingCatalog::new(0.023)));
    let rx = AccountCollector::new(Arc::new(sessions)).spawn(vec![AccountId::new("default")]);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &BucketFilter::new()).await;

    // Property 5: the failed head affects neither its siblings nor the
    // other bucket.
    assert_eq!(reports.len(), 2);
    let partial = reports.iter().find(|r| r.name == "partial").unwrap();
    assert_eq!(partial.file_count, 2);
    assert_eq!(partial.total_size, 300);
    assert_eq!(partial.failed_objects, 1);
    let pristine = reports.iter().find(|r| r.name == "pristine").unwrap();
    assert_eq!(pristine.failed_objects, 0);
    assert_eq!(pristine.total_size, 300);
}

#[tokio::test]
async fn multiple_accounts_order_by_owner_first() {
    let sessions = FakeSessionProvider::new()
        .with_account(
            "zulu",
            vec![FakeBucket::new("aaa-first-name", "us-east-1")],
        )
        .with_account("alpha", vec![FakeBucket::new("zzz-last-name", "us-east-1")]);

    let aggregator = aggregator_with(Arc::new(CountingCatalog::new(0.023)));
    let collector = AccountCollector::new(Arc::new(sessions));
    let rx = collector.spawn(vec![AccountId::new("zulu"), AccountId::new("alpha")]);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &BucketFilter::new()).await;

    // Property 4: owner dominates name in the total order.
    let order: Vec<_> = reports
        .iter()
        .map(|r| (r.owner.as_str(), r.name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("alpha", "zzz-last-name"), ("zulu", "aaa-first-name")]
    );
}

#[tokio::test]
async fn folder_keys_count_toward_size_but_not_files() {
    let newest = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();
    let sessions = FakeSessionProvider::new().with_account(
        "default",
        vec![
            FakeBucket::new("with-folders", "us-east-1")
                .with_object(FakeObject::new("docs/", 0))
                .with_object(FakeObject::new("docs/a.pdf", 1000).with_modified(newest))
                .with_object(FakeObject::new("docs/b.pdf", 2000)),
            FakeBucket::new("empty", "us-east-1"),
        ],
    );

    let aggregator = aggregator_with(Arc::new(CountingCatalog::new(0.023)));
    let rx = AccountCollector::new(Arc::new(sessions)).spawn(vec![AccountId::new("default")]);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &BucketFilter::new()).await;

    let empty = reports.iter().find(|r| r.name == "empty").unwrap();
    assert_eq!(empty.file_count, 0);
    assert_eq!(empty.last_modified, default_timestamp());

    let with_folders = reports.iter().find(|r| r.name == "with-folders").unwrap();
    // Properties 1 and 2: folder keys count toward size but not files; the
    // newest object drives last-modified.
    assert_eq!(with_folders.file_count, 2);
    assert_eq!(with_folders.total_size, 3000);
    assert_eq!(with_folders.last_modified, newest);
}

#[tokio::test]
async fn storage_class_filter_narrows_report() {
    let sessions = FakeSessionProvider::new().with_account(
        "default",
        vec![
            FakeBucket::new("cold", "us-east-1")
                .with_object(FakeObject::new("archive.tar", 100).with_storage_class("GLACIER")),
            FakeBucket::new("hot", "us-east-1").with_object(FakeObject::new("live.db", 100)),
        ],
    );

    let aggregator = aggregator_with(Arc::new(CountingCatalog::new(0.004)));
    let rx = AccountCollector::new(Arc::new(sessions)).spawn(vec![AccountId::new("default")]);
    let filter = BucketFilter::new().with_storage_class(StorageTier::Glacier);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &filter).await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "cold");
}

#[tokio::test]
async fn rendered_table_includes_all_columns() {
    let sessions = FakeSessionProvider::new().with_account(
        "default",
        vec![FakeBucket::new("report-me", "eu-west-2")
            .with_object(FakeObject::new("data.bin", 1024 * 1024))],
    );

    let aggregator = aggregator_with(Arc::new(CountingCatalog::new(0.024)));
    let rx = AccountCollector::new(Arc::new(sessions)).spawn(vec![AccountId::new("default")]);
    let reports = aggregator.aggregate(ReceiverStream::new(rx), &BucketFilter::new()).await;
    let totals = Totals::from_reports(&reports);

    let table = get_formatter(false).format_report(&reports, &totals);
    assert!(table.contains("Bucket Identifier"));
    assert!(table.contains("report-me"));
    assert!(table.contains("eu-west-2"));
    assert!(table.contains("1.0M"));

    let json = get_formatter(true).format_report(&reports, &totals);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["buckets"][0]["region"], "eu-west-2");
    assert_eq!(parsed["totals"]["buckets"], 1);
}
