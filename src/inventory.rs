//! Concurrent bucket inventory across accounts
//!
//! One task per account lists that account's buckets, resolves each bucket's
//! region, scans its objects and streams completed [`Bucket`] records onto a
//! shared bounded channel, so aggregation starts before the slowest account
//! finishes. Within an account the per-bucket and per-object work is
//! sequential.
//!
//! The channel closes exactly once, after every producer has stopped: each
//! account task owns a `Sender` clone that drops when the task ends, and a
//! supervisor task reaps the [`JoinSet`] to log panicked tasks. Producers
//! block when the channel is full, which throttles scanning against the
//! aggregator's consumption rate.

use crate::error::Result;
use crate::storage::{SessionProvider, StorageClient};
use crate::types::{AccountId, Bucket, DEFAULT_REGION, ErrObject, Object, StorageTier};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Default capacity of the shared bucket channel
pub const CHANNEL_CAPACITY: usize = 5;

/// Fan-out collector that runs one enumeration task per account
pub struct AccountCollector {
    sessions: Arc<dyn SessionProvider>,
    channel_capacity: usize,
}

impl AccountCollector {
    /// Create a collector over the given session provider
    pub fn new(sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            sessions,
            channel_capacity: CHANNEL_CAPACITY,
        }
    }

    /// Override the shared channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Spawn one enumeration task per account and return the shared channel.
    ///
    /// Any single account's total failure — session creation or bucket
    /// listing — is logged and contributes zero buckets; the other accounts
    /// keep scanning. The receiver sees end-of-stream only once every task
    /// has finished.
    pub fn spawn(&self, accounts: Vec<AccountId>) -> mpsc::Receiver<Bucket> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let mut tasks = JoinSet::new();

        for account in accounts {
            let tx = tx.clone();
            let sessions = Arc::clone(&self.sessions);
            tasks.spawn(async move {
                let client = match sessions.connect(&account).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!(account = %account, error = %e, "failed to create session for account");
                        return;
                    }
                };
                if let Err(e) = enumerate_account(client.as_ref(), &account, &tx).await {
                    error!(account = %account, error = %e, "failed to get account's bucket info");
                }
            });
        }
        drop(tx);

        // Reap account tasks; dropping the JoinSet would abort them.
        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "account task aborted");
                }
            }
            debug!("all account tasks finished");
        });

        rx
    }
}

/// List one account's buckets, resolve regions and scan objects.
///
/// A failed region lookup marks the bucket errored and skips its object scan;
/// the remaining buckets are still enumerated.
async fn enumerate_account(
    client: &dyn StorageClient,
    owner: &AccountId,
    tx: &mpsc::Sender<Bucket>,
) -> Result<()> {
    let entries = client.list_buckets().await?;
    info!(account = %owner, buckets = entries.len(), "listing buckets");

    for entry in entries {
        let mut bucket = Bucket::new(owner.clone(), entry.name, entry.created);
        match client.bucket_location(&bucket.name).await {
            Ok(constraint) => {
                // No explicit constraint means the original region.
                bucket.region = constraint.unwrap_or_else(|| DEFAULT_REGION.to_string());
                enumerate_objects(client, &mut bucket).await;
            }
            Err(e) => {
                warn!(bucket = %bucket.name, error = %e, "failed to resolve bucket region");
                bucket.error = Some(e);
            }
        }

        if tx.send(bucket).await.is_err() {
            // Receiver is gone; no point scanning further.
            break;
        }
    }

    Ok(())
}

/// Scan every object in one bucket, region-scoped.
///
/// A metadata fetch failing for one key is captured as an [`ErrObject`] and
/// never aborts the remaining keys. A failed listing marks the whole bucket
/// errored.
async fn enumerate_objects(client: &dyn StorageClient, bucket: &mut Bucket) {
    let keys = match client.list_object_keys(&bucket.name, &bucket.region).await {
        Ok(keys) => keys,
        Err(e) => {
            warn!(bucket = %bucket.name, error = %e, "failed to list bucket objects");
            bucket.error = Some(e);
            return;
        }
    };

    for key in keys {
        match client.head_object(&bucket.name, &key, &bucket.region).await {
            Ok(head) => bucket.objects.push(Object {
                bucket: bucket.name.clone(),
                key,
                size: head.size,
                last_modified: head.last_modified.unwrap_or(bucket.created),
                storage_tier: StorageTier::from_api(head.storage_class.as_deref()),
                encrypted: head.encryption.is_some(),
                encryption_type: head.encryption,
            }),
            Err(e) => {
                debug!(bucket = %bucket.name, key = %key, error = %e, "object metadata fetch failed");
                bucket.err_objects.push(ErrObject {
                    bucket: bucket.name.clone(),
                    key,
                    error: e,
                });
            }
        }
    }
}
