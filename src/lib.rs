//! s3stat - Inventory S3 buckets across accounts and estimate storage cost
//!
//! This library provides functionality to:
//! - Concurrently enumerate buckets and object metadata across AWS accounts
//! - Resolve per-gigabyte-month storage prices through a cached pricing lookup
//! - Aggregate per-bucket size, file count, last-modified and monthly cost
//! - Render the sorted report as a table or JSON
//!
//! # Examples
//!
//! ```no_run
//! use s3stat::{
//!     aggregation::{Aggregator, Totals},
//!     cost_calculator::CostCalculator,
//!     filters::BucketFilter,
//!     inventory::AccountCollector,
//!     pricing::{AwsPriceCatalog, PricingResolver},
//!     storage::AwsSessionProvider,
//!     types::AccountId,
//! };
//! use std::sync::Arc;
//! use tokio_stream::wrappers::ReceiverStream;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sessions = Arc::new(AwsSessionProvider::new(None, None));
//!     let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
//!         .load()
//!         .await;
//!     let resolver = Arc::new(PricingResolver::new(Arc::new(AwsPriceCatalog::new(&config))));
//!     let aggregator = Aggregator::new(Arc::new(CostCalculator::new(resolver)));
//!
//!     let rx = AccountCollector::new(sessions).spawn(vec![AccountId::new("default")]);
//!     let reports = aggregator
//!         .aggregate(ReceiverStream::new(rx), &BucketFilter::new())
//!         .await;
//!     let totals = Totals::from_reports(&reports);
//!     println!("{} buckets, ${:.3}/mo", totals.buckets, totals.cost);
//! }
//! ```

pub mod aggregation;
pub mod bytefmt;
pub mod cli;
pub mod cost_calculator;
pub mod error;
pub mod filters;
pub mod inventory;
pub mod output;
pub mod pricing;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{Result, S3statError};
pub use types::{AccountId, Bucket, ErrObject, Object, StorageTier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
