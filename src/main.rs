//! s3stat - Inventory S3 buckets across accounts and estimate storage cost

use clap::Parser;
use s3stat::{
    aggregation::{Aggregator, Totals, sort_reports_by_region},
    cli::Cli,
    cost_calculator::CostCalculator,
    error::Result,
    inventory::AccountCollector,
    output::get_formatter,
    pricing::{AwsPriceCatalog, PricingResolver},
    storage::{AwsSessionProvider, StaticCredentials},
};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging on stderr so diagnostics never mix into the report.
    // The --quiet flag overrides RUST_LOG.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("s3stat=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let accounts = cli.account_ids();
    let bucket_filter = cli.build_filter()?;
    info!(accounts = accounts.len(), "starting bucket inventory");

    // Session provider for the per-account scans; one shared config for the
    // pricing client, which is account-independent.
    let credentials = match (&cli.access_key_id, &cli.secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
        }),
        _ => None,
    };
    let sessions = Arc::new(AwsSessionProvider::new(credentials, cli.endpoint.clone()));

    let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let catalog = Arc::new(AwsPriceCatalog::new(&shared_config));
    let resolver = Arc::new(PricingResolver::new(catalog));
    let cost_calculator = Arc::new(CostCalculator::new(resolver));
    let aggregator = Aggregator::new(cost_calculator);

    // Fan out one task per account; aggregate as buckets arrive.
    let collector = AccountCollector::new(sessions);
    let rx = collector.spawn(accounts);
    let mut reports = aggregator
        .aggregate(ReceiverStream::new(rx), &bucket_filter)
        .await;

    if cli.group_by_region {
        sort_reports_by_region(&mut reports);
    }

    info!(buckets = reports.len(), "inventory complete");

    let totals = Totals::from_reports(&reports);
    let formatter = get_formatter(cli.json);
    let rendered = if cli.group_by_region {
        formatter.format_report_by_region(&reports, &totals)
    } else {
        formatter.format_report(&reports, &totals)
    };
    println!("{rendered}");

    Ok(())
}
