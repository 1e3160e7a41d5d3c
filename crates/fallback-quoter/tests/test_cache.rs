//! Price cache behavior: single-flight, TTL, manual sets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fallback_quoter::price_cache::{PriceCache, PriceFeed};

/// Feed that counts calls per id and answers from a fixed table after an
/// optional delay.
struct CountingFeed {
    prices: Mutex<HashMap<String, f64>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingFeed {
    fn new(prices: &[(&str, f64)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            prices: Mutex::new(
                prices
                    .iter()
                    .map(|(id, p)| (id.to_string(), *p))
                    .collect(),
            ),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set(&self, id: &str, price: f64) {
        self.prices.lock().unwrap().insert(id.to_string(), price);
    }
}

#[async_trait]
impl PriceFeed for CountingFeed {
    async fn fetch_price(&self, id: &str) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.prices.lock().unwrap().get(id).copied()
    }
}

#[tokio::test]
async fn concurrent_lookups_share_one_fetch() {
    let feed = CountingFeed::new(&[("SOL", 170.0)], Duration::from_millis(50));
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.get_price("SOL").await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Some(170.0));
    }
    assert_eq!(feed.calls(), 1);

    // Settled fetch is cached; no further network traffic.
    assert_eq!(cache.get_price("SOL").await, Some(170.0));
    assert_eq!(feed.calls(), 1);
}

#[tokio::test]
async fn distinct_ids_fetch_independently() {
    let feed = CountingFeed::new(
        &[("SOL", 170.0), ("USDC", 1.0)],
        Duration::from_millis(20),
    );
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    let (sol, usdc) = tokio::join!(cache.get_price("SOL"), cache.get_price("USDC"));
    assert_eq!(sol, Some(170.0));
    assert_eq!(usdc, Some(1.0));
    assert_eq!(feed.calls(), 2);
}

#[tokio::test]
async fn expired_entries_are_misses() {
    let feed = CountingFeed::new(&[("SOL", 170.0)], Duration::ZERO);
    let cache = PriceCache::with_ttl(
        feed.clone() as Arc<dyn PriceFeed>,
        Duration::from_millis(40),
    );

    assert_eq!(cache.get_price("SOL").await, Some(170.0));
    assert_eq!(cache.get_price("SOL").await, Some(170.0));
    assert_eq!(feed.calls(), 1);

    feed.set("SOL", 171.5);
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Past the TTL the old entry must not be served.
    assert_eq!(cache.get_price("SOL").await, Some(171.5));
    assert_eq!(feed.calls(), 2);
}

#[tokio::test]
async fn manual_set_serves_without_fetching() {
    let feed = CountingFeed::new(&[], Duration::ZERO);
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    cache.set_price("JUP", 0.85);
    assert_eq!(cache.get_price("JUP").await, Some(0.85));
    assert_eq!(feed.calls(), 0);
}

#[tokio::test]
async fn manual_set_expires_like_any_entry() {
    let feed = CountingFeed::new(&[], Duration::ZERO);
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    cache.set_price_with_ttl("JUP", 0.85, Duration::from_millis(30));
    assert_eq!(cache.get_price("JUP").await, Some(0.85));
    assert_eq!(feed.calls(), 0);

    tokio::time::sleep(Duration::from_millis(60)).await;
    // Expired: the miss goes to the feed, which knows nothing.
    assert_eq!(cache.get_price("JUP").await, None);
    assert_eq!(feed.calls(), 1);
}

#[tokio::test]
async fn invalid_manual_set_is_a_noop() {
    let feed = CountingFeed::new(&[], Duration::ZERO);
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    cache.set_price("JUP", 0.0);
    cache.set_price("JUP", -1.0);
    cache.set_price("JUP", f64::NAN);
    cache.set_price("JUP", f64::INFINITY);

    // Nothing was stored, so the lookup goes to the (empty) feed.
    assert_eq!(cache.get_price("JUP").await, None);
    assert_eq!(feed.calls(), 1);
}

#[tokio::test]
async fn failed_fetches_are_not_cached() {
    let feed = CountingFeed::new(&[], Duration::ZERO);
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    assert_eq!(cache.get_price("SOL").await, None);
    assert_eq!(cache.get_price("SOL").await, None);
    // Each miss retried the feed: failures never occupy a cache slot.
    assert_eq!(feed.calls(), 2);

    // Once the feed knows the price the next lookup succeeds and sticks.
    feed.set("SOL", 169.0);
    assert_eq!(cache.get_price("SOL").await, Some(169.0));
    assert_eq!(cache.get_price("SOL").await, Some(169.0));
    assert_eq!(feed.calls(), 3);
}

/// Feed that panics on its first call and answers normally afterwards.
struct FlakyFeed {
    calls: AtomicUsize,
}

#[async_trait]
impl PriceFeed for FlakyFeed {
    async fn fetch_price(&self, _id: &str) -> Option<f64> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("feed crashed");
        }
        Some(170.0)
    }
}

#[tokio::test]
async fn panicking_feed_does_not_wedge_the_id() {
    let feed = Arc::new(FlakyFeed {
        calls: AtomicUsize::new(0),
    });
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    // The panic surfaces as an ordinary miss.
    assert_eq!(cache.get_price("SOL").await, None);
    // The pending slot was cleared, so the next lookup retries instead of
    // attaching to the dead fetch.
    assert_eq!(cache.get_price("SOL").await, Some(170.0));
    assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn abandoned_caller_still_populates_cache() {
    let feed = CountingFeed::new(&[("SOL", 170.0)], Duration::from_millis(30));
    let cache = PriceCache::new(feed.clone() as Arc<dyn PriceFeed>);

    // Drop the awaiting task mid-flight.
    let handle = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get_price("SOL").await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    handle.abort();

    // The spawned fetch keeps running and lands in the cache.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.get_price("SOL").await, Some(170.0));
    assert_eq!(feed.calls(), 1);
}
