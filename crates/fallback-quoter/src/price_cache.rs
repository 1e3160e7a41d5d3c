//! TTL-bounded USD price cache with single-flight fetch deduplication.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

/// Default freshness window for a fetched price.
pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(60);

/// Source of live USD prices per token identifier.
///
/// Returns `None` for every failure mode (network error, bad status,
/// malformed payload, unknown id) so the cache never has to distinguish
/// them. The production implementation is [`HttpPriceFeed`].
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_price(&self, id: &str) -> Option<f64>;
}

/// Price feed backed by `GET <base>?ids=<id>` returning
/// `{ "data": { "<id>": { "price": ... } } }`.
pub struct HttpPriceFeed {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPriceFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

/// Tolerant extraction of the `price` field: upstream has shipped it both
/// as a JSON number and as a numeric string, so candidates are tried in
/// that order. Non-finite and non-positive values are rejected.
fn extract_price(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.parse::<f64>().ok()?,
        _ => return None,
    };
    if raw.is_finite() && raw > 0.0 {
        Some(raw)
    } else {
        None
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn fetch_price(&self, id: &str) -> Option<f64> {
        let resp = match self
            .http
            .get(&self.base_url)
            .query(&[("ids", id)])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("price feed request for {id} failed: {e}");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("price feed returned status {} for {id}", resp.status());
            return None;
        }
        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("price feed returned malformed JSON for {id}: {e}");
                return None;
            }
        };
        let price = body
            .get("data")
            .and_then(|data| data.get(id))
            .and_then(|entry| entry.get("price"))
            .and_then(extract_price);
        if price.is_none() {
            debug!("price feed had no usable price for {id}");
        }
        price
    }
}

struct CacheEntry {
    price: f64,
    expires_at: Instant,
}

type SharedFetch = Shared<BoxFuture<'static, Option<f64>>>;

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    pending: HashMap<String, SharedFetch>,
}

struct CacheShared {
    feed: Arc<dyn PriceFeed>,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

/// Read-through price cache. Cheap to clone; clones share state.
///
/// Concurrent lookups for the same id before the in-flight fetch settles
/// all attach to that single fetch. The fetch runs as a spawned task, so
/// it still populates the cache even when every original caller has gone
/// away. The lock is only held for map bookkeeping, never across an await.
#[derive(Clone)]
pub struct PriceCache {
    shared: Arc<CacheShared>,
}

impl PriceCache {
    pub fn new(feed: Arc<dyn PriceFeed>) -> Self {
        Self::with_ttl(feed, DEFAULT_PRICE_TTL)
    }

    pub fn with_ttl(feed: Arc<dyn PriceFeed>, ttl: Duration) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                feed,
                ttl,
                inner: Mutex::new(CacheInner {
                    entries: HashMap::new(),
                    pending: HashMap::new(),
                }),
            }),
        }
    }

    /// Cached price for `id`, fetching on a miss.
    ///
    /// Fresh entry: returned as is. Expired entry: dropped and treated as
    /// a miss. Miss with a fetch already in flight: awaits that fetch.
    /// Otherwise a new fetch is started. `None` means "unknown, use the
    /// fallback reference price" and is never cached.
    pub async fn get_price(&self, id: &str) -> Option<f64> {
        let fetch = {
            let mut inner = self.shared.inner.lock().unwrap();
            match inner.entries.get(id) {
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Some(entry.price);
                }
                Some(_) => {
                    inner.entries.remove(id);
                }
                None => {}
            }
            if let Some(pending) = inner.pending.get(id) {
                pending.clone()
            } else {
                let fetch = spawn_fetch(Arc::clone(&self.shared), id.to_string());
                inner.pending.insert(id.to_string(), fetch.clone());
                fetch
            }
        };
        fetch.await
    }

    /// Insert or overwrite the cached price for `id` with the default TTL.
    ///
    /// Silently ignores non-finite or non-positive prices. Used to fan a
    /// freshly resolved price out across a token's aliases without
    /// refetching per alias.
    pub fn set_price(&self, id: &str, price: f64) {
        self.set_price_with_ttl(id, price, self.shared.ttl);
    }

    pub fn set_price_with_ttl(&self, id: &str, price: f64, ttl: Duration) {
        if !price.is_finite() || price <= 0.0 {
            debug!("ignoring invalid cached price {price} for {id}");
            return;
        }
        let mut inner = self.shared.inner.lock().unwrap();
        inner.entries.insert(
            id.to_string(),
            CacheEntry {
                price,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

/// Clears the pending slot when the fetch task ends, however it ends. A
/// feed that panics unwinds through this, so the id can never stay
/// pinned to a dead fetch.
struct PendingGuard {
    shared: Arc<CacheShared>,
    id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.shared.inner.lock() {
            inner.pending.remove(&self.id);
        }
    }
}

/// Spawn the fetch for `id` and hand back a cloneable future over its
/// outcome. The task stores successful prices itself and clears the
/// pending slot on settlement (success, failure, or panic), so cache
/// population does not depend on any caller still awaiting. The entry is
/// written before the guard releases the pending slot, so a concurrent
/// lookup sees one or the other, never neither.
fn spawn_fetch(shared: Arc<CacheShared>, id: String) -> SharedFetch {
    let task = tokio::spawn(async move {
        let guard = PendingGuard { shared, id };
        let price = guard
            .shared
            .feed
            .fetch_price(&guard.id)
            .await
            .filter(|p| p.is_finite() && *p > 0.0);
        if let Some(price) = price {
            let mut inner = guard.shared.inner.lock().unwrap();
            inner.entries.insert(
                guard.id.clone(),
                CacheEntry {
                    price,
                    expires_at: Instant::now() + guard.shared.ttl,
                },
            );
        }
        price
    });
    task.map(|res| res.ok().flatten()).boxed().shared()
}
