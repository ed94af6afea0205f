//! CLI interface for s3stat
//!
//! Defines the command-line surface using clap: which accounts to inventory,
//! optional manual credentials, report filters and output mode.
//!
//! # Example
//!
//! ```bash
//! # Inventory two profiles, grouped by region
//! s3stat --account prod,staging --group-by-region
//!
//! # One bucket as JSON
//! s3stat --bucket s3://example-bucket --json
//! ```

use crate::error::{Result, S3statError};
use crate::filters::BucketFilter;
use crate::types::{AccountId, StorageTier};
use clap::Parser;

/// AWS S3 bucket metrics and storage cost tool
#[derive(Parser, Debug, Clone)]
#[command(name = "s3stat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Accounts (profiles in the AWS credentials file) to inventory
    #[arg(long = "account", value_delimiter = ',', default_value = "default")]
    pub accounts: Vec<String>,

    /// AWS API Access Key ID for alternate manual API credentials
    #[arg(long, requires = "secret_access_key")]
    pub access_key_id: Option<String>,

    /// AWS API Secret Access Key for alternate manual API credentials
    #[arg(long, requires = "access_key_id")]
    pub secret_access_key: Option<String>,

    /// Only report the specified bucket, e.g. s3://example-bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Only report buckets whose name matches the pattern, e.g. "prod-*"
    #[arg(long)]
    pub pattern: Option<String>,

    /// Only report buckets containing objects of the specified storage class,
    /// e.g. STANDARD_IA
    #[arg(long)]
    pub storage_class: Option<String>,

    /// Group the report by region
    #[arg(long)]
    pub group_by_region: bool,

    /// Custom S3 endpoint, for LocalStack-style test setups
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Cli {
    /// The accounts to scan, as typed identifiers
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.accounts.iter().map(AccountId::new).collect()
    }

    /// Build the bucket filter from the flag set
    pub fn build_filter(&self) -> Result<BucketFilter> {
        let mut filter = BucketFilter::new();
        if let Some(bucket) = &self.bucket {
            filter = filter.with_bucket(parse_bucket_name(bucket));
        }
        if let Some(pattern) = &self.pattern {
            filter = filter.with_pattern(parse_bucket_name(pattern));
        }
        if let Some(class) = &self.storage_class {
            filter = filter.with_storage_class(parse_storage_class(class)?);
        }
        Ok(filter)
    }
}

/// Accept both a bare bucket name and an `s3://` URI
pub fn parse_bucket_name(arg: &str) -> String {
    arg.strip_prefix("s3://")
        .unwrap_or(arg)
        .trim_end_matches('/')
        .to_string()
}

/// Parse a storage-class flag value into a known tier
pub fn parse_storage_class(arg: &str) -> Result<StorageTier> {
    match StorageTier::from_api(Some(arg.to_uppercase().as_str())) {
        StorageTier::Other(unknown) => Err(S3statError::InvalidArgument(format!(
            "unknown storage class: {unknown}"
        ))),
        tier => Ok(tier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_uri_scheme() {
        assert_eq!(parse_bucket_name("s3://example-bucket"), "example-bucket");
        assert_eq!(parse_bucket_name("s3://example-bucket/"), "example-bucket");
        assert_eq!(parse_bucket_name("plain-name"), "plain-name");
    }

    #[test]
    fn parses_known_storage_classes() {
        assert_eq!(
            parse_storage_class("standard_ia").unwrap(),
            StorageTier::StandardIa
        );
        assert_eq!(parse_storage_class("GLACIER").unwrap(), StorageTier::Glacier);
    }

    #[test]
    fn rejects_unknown_storage_class() {
        let err = parse_storage_class("SHINY_NEW_TIER").unwrap_err();
        assert!(matches!(err, S3statError::InvalidArgument(_)));
    }

    #[test]
    fn builds_combined_filter() {
        let cli = Cli::parse_from([
            "s3stat",
            "--bucket",
            "s3://data",
            "--storage-class",
            "GLACIER",
        ]);
        let filter = cli.build_filter().unwrap();
        assert_eq!(filter.bucket.as_deref(), Some("data"));
        assert_eq!(filter.storage_class, Some(StorageTier::Glacier));
    }

    #[test]
    fn accounts_split_on_commas() {
        let cli = Cli::parse_from(["s3stat", "--account", "prod,staging"]);
        assert_eq!(
            cli.account_ids(),
            vec![AccountId::new("prod"), AccountId::new("staging")]
        );
    }

    #[test]
    fn defaults_to_default_account() {
        let cli = Cli::parse_from(["s3stat"]);
        assert_eq!(cli.account_ids(), vec![AccountId::new("default")]);
    }
}
