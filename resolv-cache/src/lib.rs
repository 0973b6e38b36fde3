//! TTL-indexed store of resource records, keyed by `(name, type, class)`.
//!
//! Positive entries carry their own absolute expiry, capped by
//! [`Config::positive_cap_s`]; negative entries remember an authoritative
//! NXDOMAIN for a name for up to [`Config::negative_cap_s`], following the
//! SOA `minimum` field when the caller has one.

use moka::future::Cache as MokaCache;
use resolv_proto::packet::header::ResponseCode;
use resolv_proto::packet::question::DnsClass;
use resolv_proto::packet::QueryType;
use resolv_proto::{Name, Record};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "Config::default_positive_cap_s")]
    pub positive_cap_s: u32,
    #[serde(default = "Config::default_negative_cap_s")]
    pub negative_cap_s: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
            positive_cap_s: Self::default_positive_cap_s(),
            negative_cap_s: Self::default_negative_cap_s(),
        }
    }
}

impl Config {
    fn default_max_entries() -> u64 {
        10_000
    }

    fn default_positive_cap_s() -> u32 {
        3600
    }

    fn default_negative_cap_s() -> u32 {
        300
    }
}

impl Config {
    pub fn build(self) -> Cache {
        Cache::new(self)
    }
}

type PositiveKey = (Name, QueryType, DnsClass);
type NegativeKey = (Name, DnsClass);

#[derive(Debug, Clone)]
struct PositiveEntry {
    records: Vec<Record>,
    expires_at: SystemTime,
}

#[derive(Debug, Clone)]
struct NegativeEntry {
    rcode: ResponseCode,
    expires_at: SystemTime,
}

/// Shared positive/negative record cache. Cheap to clone: the underlying
/// `moka` caches are reference-counted, same as the teacher's own
/// `MemoryCacheService` was built around a single shared `moka::future::Cache`.
#[derive(Debug, Clone)]
pub struct Cache {
    config: Config,
    positive: MokaCache<PositiveKey, PositiveEntry>,
    negative: MokaCache<NegativeKey, NegativeEntry>,
}

impl Cache {
    pub fn new(config: Config) -> Self {
        Self {
            positive: MokaCache::new(config.max_entries),
            negative: MokaCache::new(config.max_entries),
            config,
        }
    }

    /// Inserts (or merges into) the entry for `record`'s owner name/type.
    ///
    /// A `ttl` of zero is accepted but never stored: the record is only
    /// meaningful to the caller that just received it.
    #[tracing::instrument(skip(self, record), fields(name = %record.domain(), qtype = ?record.qtype()))]
    pub async fn put(&self, record: Record, class: DnsClass) {
        if record.ttl() == 0 {
            tracing::debug!("ttl=0 record accepted but not cached");
            return;
        }

        let key = (record.domain().clone(), record.qtype(), class);
        let now = SystemTime::now();
        let capped = Duration::from_secs(record.ttl().min(self.config.positive_cap_s) as u64);
        let candidate_expiry = now + capped;

        let existing = self.positive.get(&key).await.filter(|e| e.expires_at > now);
        let (mut records, expires_at) = match existing {
            Some(entry) => (entry.records, entry.expires_at.max(candidate_expiry)),
            None => (Vec::new(), candidate_expiry),
        };

        // Same (name, type, class, rdata): refresh in place rather than duplicate.
        let bare = record.with_ttl(0);
        if let Some(slot) = records.iter_mut().find(|r| r.with_ttl(0) == bare) {
            *slot = record;
        } else {
            records.push(record);
        }

        self.positive
            .insert(key, PositiveEntry { records, expires_at })
            .await;
    }

    pub async fn put_many(&self, records: impl IntoIterator<Item = Record>, class: DnsClass) {
        for record in records {
            self.put(record, class).await;
        }
    }

    /// Records an authoritative NXDOMAIN for `question.name`, capped by the
    /// zone's SOA `minimum` when known.
    #[tracing::instrument(skip(self))]
    pub async fn put_negative(
        &self,
        name: &Name,
        class: DnsClass,
        rcode: ResponseCode,
        soa_minimum: Option<u32>,
    ) {
        let ttl = soa_minimum
            .unwrap_or(self.config.negative_cap_s)
            .min(self.config.negative_cap_s);
        let expires_at = SystemTime::now() + Duration::from_secs(ttl as u64);
        self.negative
            .insert((name.clone(), class), NegativeEntry { rcode, expires_at })
            .await;
    }

    /// Looks up positive records for `(name, qtype, class)`. The boolean is
    /// `true` only when a fresh set was found; an expired set evicts itself
    /// and is reported as a miss, never as stale data.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, name: &Name, qtype: QueryType, class: DnsClass) -> (Vec<Record>, bool) {
        let key = (name.clone(), qtype, class);
        let Some(entry) = self.positive.get(&key).await else {
            return (Vec::new(), false);
        };
        let now = SystemTime::now();
        let Ok(remaining) = entry.expires_at.duration_since(now) else {
            self.positive.invalidate(&key).await;
            return (Vec::new(), false);
        };
        let remaining = remaining.as_secs().min(u32::MAX as u64) as u32;
        let records = entry.records.iter().map(|r| r.with_ttl(remaining)).collect();
        (records, true)
    }

    /// Looks up a cached NXDOMAIN for `(name, class)`, irrespective of type.
    #[tracing::instrument(skip(self))]
    pub async fn get_negative(&self, name: &Name, class: DnsClass) -> Option<ResponseCode> {
        let key = (name.clone(), class);
        let entry = self.negative.get(&key).await?;
        if entry.expires_at <= SystemTime::now() {
            self.negative.invalidate(&key).await;
            return None;
        }
        Some(entry.rcode)
    }

    pub async fn clear(&self) {
        self.positive.invalidate_all();
        self.negative.invalidate_all();
        self.positive.run_pending_tasks().await;
        self.negative.run_pending_tasks().await;
    }

    /// Forces processing of entries that have passed their expiry but have
    /// not yet been touched by a `get`/`put`. `moka` expires lazily on
    /// access; this is the explicit sweep the cache spec calls for.
    pub async fn prune_expired(&self) {
        self.positive.run_pending_tasks().await;
        self.negative.run_pending_tasks().await;
    }
}

/// The cache seam the query engine depends on, so a test can swap in a
/// fake store without dragging `moka` into the picture.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn put(&self, record: Record, class: DnsClass);
    async fn put_many(&self, records: Vec<Record>, class: DnsClass);
    async fn put_negative(&self, name: &Name, class: DnsClass, rcode: ResponseCode, soa_minimum: Option<u32>);
    async fn get(&self, name: &Name, qtype: QueryType, class: DnsClass) -> (Vec<Record>, bool);
    async fn get_negative(&self, name: &Name, class: DnsClass) -> Option<ResponseCode>;
}

#[async_trait::async_trait]
impl CacheStore for Cache {
    async fn put(&self, record: Record, class: DnsClass) {
        Cache::put(self, record, class).await
    }

    async fn put_many(&self, records: Vec<Record>, class: DnsClass) {
        Cache::put_many(self, records, class).await
    }

    async fn put_negative(&self, name: &Name, class: DnsClass, rcode: ResponseCode, soa_minimum: Option<u32>) {
        Cache::put_negative(self, name, class, rcode, soa_minimum).await
    }

    async fn get(&self, name: &Name, qtype: QueryType, class: DnsClass) -> (Vec<Record>, bool) {
        Cache::get(self, name, qtype, class).await
    }

    async fn get_negative(&self, name: &Name, class: DnsClass) -> Option<ResponseCode> {
        Cache::get_negative(self, name, class).await
    }
}
