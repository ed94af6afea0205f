//! Cost calculator for monthly storage estimates

use crate::bytefmt::to_gigabytes;
use crate::error::Result;
use crate::pricing::PricingResolver;
use crate::types::{Bucket, Object};
use std::sync::Arc;
use tracing::debug;

/// Computes estimated monthly storage cost from object metadata and prices
pub struct CostCalculator {
    resolver: Arc<PricingResolver>,
}

impl CostCalculator {
    /// Create a new CostCalculator
    pub fn new(resolver: Arc<PricingResolver>) -> Self {
        Self { resolver }
    }

    /// Monthly cost of one object: gigabytes × price for the object's own
    /// storage tier in the bucket's region.
    pub async fn object_monthly_cost(&self, object: &Object, region: &str) -> Result<f64> {
        let price = self
            .resolver
            .price_per_gb_month(region, &object.storage_tier)
            .await?;
        Ok(to_gigabytes(object.size) * price)
    }

    /// Monthly cost of a bucket: sum over its objects.
    ///
    /// Each object is priced under its own tier; a bucket mixing STANDARD and
    /// GLACIER objects pays two different rates. Any pricing failure degrades
    /// the whole bucket's estimate (the caller renders it as unpriceable).
    pub async fn bucket_monthly_cost(&self, bucket: &Bucket) -> Result<f64> {
        let mut cost = 0.0;
        for object in &bucket.objects {
            cost += self.object_monthly_cost(object, &bucket.region).await?;
        }

        debug!(
            bucket = %bucket.name,
            objects = bucket.objects.len(),
            cost,
            "calculated bucket monthly cost"
        );
        Ok(cost)
    }
}
