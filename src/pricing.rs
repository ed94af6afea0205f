//! Pricing resolution for storage tiers
//!
//! Maps a (region, storage tier) pair onto the pricing catalog's filter
//! dimensions, queries the catalog through the [`PriceCatalog`] seam and
//! memoizes results in a TTL cache. Prices found by a live lookup are pinned
//! for the lifetime of the process; the pricing catalog does not change fast
//! enough to matter within one run.

use crate::error::{Result, S3statError};
use crate::types::StorageTier;
use aws_sdk_pricing::types::{Filter, FilterType};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// The pricing API is only served from a handful of regions.
const PRICING_ENDPOINT_REGION: &str = "ap-south-1";

/// Service code for S3 rows in the pricing catalog
const SERVICE_CODE: &str = "AmazonS3";

/// Region code → usage-type prefix used by the pricing catalog.
///
/// Closed table; a region missing here is an [`S3statError::UnsupportedRegion`].
static REGION_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ap-east-1", "APE1"),
        ("ap-northeast-1", "APN1"),
        ("ap-northeast-2", "APN2"),
        ("ap-northeast-3", "APN3"),
        ("ap-southeast-1", "APS1"),
        ("ap-southeast-2", "APS2"),
        ("ap-south-1", "APS3"),
        ("cn-north-1", "CNN1"),
        ("cn-northwest-1", "CNW1"),
        ("ca-central-1", "CAN1"),
        ("eu-north-1", "EUN1"),
        ("eu-central-1", "EUC1"),
        ("eu-west-1", "EU"),
        ("eu-west-2", "EUW2"),
        ("eu-west-3", "EUW3"),
        ("sa-east-1", "SAE1"),
        ("me-south-1", "MES1"),
        ("us-gov-west-1", "UGW1"),
        ("us-gov-east-1", "UGE1"),
        ("us-east-1", "USE1"),
        ("us-east-2", "USE2"),
        ("us-west-1", "USW1"),
        ("us-west-2", "USW2"),
    ])
});

/// Catalog metadata for one storage tier
struct TierMetadata {
    volume_type: &'static str,
    short_code: &'static str,
    storage_class: &'static str,
}

fn tier_metadata(tier: &StorageTier) -> Option<&'static TierMetadata> {
    match tier {
        StorageTier::Standard => Some(&TierMetadata {
            volume_type: "Standard",
            short_code: "",
            storage_class: "General Purpose",
        }),
        StorageTier::ReducedRedundancy => Some(&TierMetadata {
            volume_type: "Reduced Redundancy",
            short_code: "RRS",
            storage_class: "Non-Critical Data",
        }),
        StorageTier::StandardIa => Some(&TierMetadata {
            volume_type: "Standard - Infrequent Access",
            short_code: "SIA",
            storage_class: "Infrequent Access",
        }),
        StorageTier::OnezoneIa => Some(&TierMetadata {
            volume_type: "One Zone - Infrequent Access",
            short_code: "ZIA",
            storage_class: "Infrequent Access",
        }),
        StorageTier::IntelligentTiering => Some(&TierMetadata {
            volume_type: "Intelligent-Tiering Infrequent Access",
            short_code: "INT-IA",
            storage_class: "Intelligent-Tiering",
        }),
        StorageTier::Glacier => Some(&TierMetadata {
            volume_type: "Amazon Glacier",
            short_code: "Glacier",
            storage_class: "Archive",
        }),
        StorageTier::DeepArchive => Some(&TierMetadata {
            volume_type: "Glacier Deep Archive",
            short_code: "GDA",
            storage_class: "Staging",
        }),
        StorageTier::Other(_) => None,
    }
}

/// Exact-match filter dimensions for one pricing-catalog query
///
/// Deterministically derived from (region, storage tier); also serves as the
/// price-cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingFilters {
    /// e.g. "USE1-TimedStorage-SIA-ByteHrs"
    pub usage_type: String,
    /// e.g. "Infrequent Access"
    pub storage_class: String,
    /// e.g. "Standard - Infrequent Access"
    pub volume_type: String,
}

impl PricingFilters {
    /// Derive the filter triple for a region and storage tier.
    ///
    /// # Errors
    ///
    /// Returns [`S3statError::UnsupportedRegion`] or
    /// [`S3statError::UnsupportedStorageClass`] when either side of the pair
    /// is missing from the closed lookup tables.
    pub fn derive(region: &str, tier: &StorageTier) -> Result<Self> {
        let region_code = REGION_CODES
            .get(region)
            .ok_or_else(|| S3statError::UnsupportedRegion(region.to_string()))?;
        let meta = tier_metadata(tier)
            .ok_or_else(|| S3statError::UnsupportedStorageClass(tier.to_string()))?;

        let usage_type = if meta.short_code.is_empty() {
            format!("{region_code}-TimedStorage-ByteHrs")
        } else {
            format!("{region_code}-TimedStorage-{}-ByteHrs", meta.short_code)
        };

        Ok(Self {
            usage_type,
            storage_class: meta.storage_class.to_string(),
            volume_type: meta.volume_type.to_string(),
        })
    }

    /// Concatenated cache key for this filter set
    pub fn cache_key(&self) -> String {
        format!("{}{}{}", self.usage_type, self.storage_class, self.volume_type)
    }
}

struct CacheEntry {
    price: f64,
    /// None = pinned for the process lifetime
    expires_at: Option<Instant>,
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    last_sweep: Instant,
}

/// Bounded-TTL memoization layer in front of the pricing catalog
///
/// Entries inserted through [`PriceCache::insert_pinned`] never expire;
/// plain inserts carry the default TTL. Expired entries are dropped lazily on
/// read and swept from the map once per sweep interval.
pub struct PriceCache {
    state: RwLock<CacheState>,
    default_ttl: Duration,
    sweep_interval: Duration,
}

impl PriceCache {
    /// Default entry TTL for unpinned entries
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
    /// Default interval between sweeps of expired entries
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

    /// Create a cache with the given TTL and sweep interval
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            default_ttl,
            sweep_interval,
        }
    }

    /// Look up a cached price; expired entries read as absent
    pub async fn get(&self, key: &str) -> Option<f64> {
        let state = self.state.read().await;
        let entry = state.entries.get(key)?;
        if let Some(expires_at) = entry.expires_at {
            if Instant::now() >= expires_at {
                return None;
            }
        }
        Some(entry.price)
    }

    /// Insert a price with the default TTL
    pub async fn insert(&self, key: impl Into<String>, price: f64) {
        let expires_at = Some(Instant::now() + self.default_ttl);
        self.insert_entry(key.into(), price, expires_at).await;
    }

    /// Insert a price that stays valid for the process lifetime
    pub async fn insert_pinned(&self, key: impl Into<String>, price: f64) {
        self.insert_entry(key.into(), price, None).await;
    }

    async fn insert_entry(&self, key: String, price: f64, expires_at: Option<Instant>) {
        let mut state = self.state.write().await;
        let now = Instant::now();
        if now.duration_since(state.last_sweep) >= self.sweep_interval {
            state
                .entries
                .retain(|_, e| e.expires_at.is_none_or(|t| t > now));
            state.last_sweep = now;
        }
        state.entries.insert(key, CacheEntry { price, expires_at });
    }

    /// Number of live entries (expired-but-unswept entries included)
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// True when the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL, Self::DEFAULT_SWEEP_INTERVAL)
    }
}

/// Seam over the pricing service
///
/// Returns the USD unit price for the first matching on-demand catalog row,
/// or `None` when no row matches the filters.
#[async_trait::async_trait]
pub trait PriceCatalog: Send + Sync {
    async fn unit_price(&self, filters: &PricingFilters) -> Result<Option<f64>>;
}

/// Cache-first price resolution for (region, storage tier) pairs
pub struct PricingResolver {
    catalog: Arc<dyn PriceCatalog>,
    cache: PriceCache,
}

impl PricingResolver {
    /// Create a resolver over the given catalog with a fresh cache
    pub fn new(catalog: Arc<dyn PriceCatalog>) -> Self {
        Self {
            catalog,
            cache: PriceCache::default(),
        }
    }

    /// Price per gigabyte-month for objects of `tier` stored in `region`.
    ///
    /// Cache hits return immediately; misses query the catalog once and pin
    /// the result. Two consecutive calls with the same pair issue exactly one
    /// live query.
    pub async fn price_per_gb_month(&self, region: &str, tier: &StorageTier) -> Result<f64> {
        let filters = PricingFilters::derive(region, tier)?;
        let key = filters.cache_key();

        if let Some(price) = self.cache.get(&key).await {
            debug!(usage_type = %filters.usage_type, price, "price cache hit");
            return Ok(price);
        }

        let price = self
            .catalog
            .unit_price(&filters)
            .await?
            .ok_or_else(|| S3statError::PriceUnavailable(filters.usage_type.clone()))?;

        debug!(usage_type = %filters.usage_type, price, "fetched price from catalog");
        self.cache.insert_pinned(key, price).await;
        Ok(price)
    }
}

/// Pricing catalog backed by the AWS Pricing API
pub struct AwsPriceCatalog {
    client: aws_sdk_pricing::Client,
}

impl AwsPriceCatalog {
    /// Build a catalog client from the shared AWS configuration.
    ///
    /// The client is re-scoped to a region that serves the pricing endpoint,
    /// independent of where the buckets live.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        let pricing_config = aws_sdk_pricing::config::Builder::from(config)
            .region(aws_sdk_pricing::config::Region::new(PRICING_ENDPOINT_REGION))
            .build();
        Self {
            client: aws_sdk_pricing::Client::from_conf(pricing_config),
        }
    }

    fn term_match(field: &str, value: &str) -> Result<Filter> {
        Filter::builder()
            .r#type(FilterType::TermMatch)
            .field(field)
            .value(value)
            .build()
            .map_err(|e| S3statError::Pricing(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PriceCatalog for AwsPriceCatalog {
    async fn unit_price(&self, filters: &PricingFilters) -> Result<Option<f64>> {
        let response = self
            .client
            .get_products()
            .service_code(SERVICE_CODE)
            .filters(Self::term_match("usagetype", &filters.usage_type)?)
            .filters(Self::term_match("storageClass", &filters.storage_class)?)
            .filters(Self::term_match("volumeType", &filters.volume_type)?)
            .send()
            .await
            .map_err(|e| S3statError::Pricing(e.to_string()))?;

        for document in response.price_list() {
            let product: serde_json::Value = serde_json::from_str(document)?;
            if let Some(price) = first_on_demand_usd(&product) {
                return Ok(Some(price));
            }
        }
        Ok(None)
    }
}

/// Pull the USD unit price out of the first on-demand term of a price-list
/// document. The document nests terms → offers → price dimensions, each level
/// keyed by opaque SKU-derived identifiers.
fn first_on_demand_usd(product: &serde_json::Value) -> Option<f64> {
    let on_demand = product.get("terms")?.get("OnDemand")?.as_object()?;
    for offer in on_demand.values() {
        let Some(dimensions) = offer.get("priceDimensions").and_then(|d| d.as_object()) else {
            continue;
        };
        for dimension in dimensions.values() {
            if let Some(usd) = dimension
                .get("pricePerUnit")
                .and_then(|p| p.get("USD"))
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<f64>().ok())
            {
                return Some(usd);
            }
        }
    }
    None
}
