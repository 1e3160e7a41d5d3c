use std::sync::Arc;
use std::time::Duration;

use fallback_quoter::api::ApiServer;
use fallback_quoter::config::AppConfig;
use fallback_quoter::price_cache::{HttpPriceFeed, PriceCache, DEFAULT_PRICE_TTL};
use fallback_quoter::registry::TokenRegistry;
use fallback_quoter::QuoteEngine;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = AppConfig::load();

    let feed = Arc::new(HttpPriceFeed::new(config.price_feed_url.clone()));
    let ttl = config
        .price_ttl_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PRICE_TTL);
    let prices = PriceCache::with_ttl(feed, ttl);
    let engine = QuoteEngine::new(TokenRegistry::with_defaults(), prices);

    let server = ApiServer::new(Arc::new(engine), config.network, config.slippage_bps);
    let addr = config.api_addr.clone();

    tokio::spawn(async move {
        server.start(&addr).await;
    });

    // Keep runtime alive until ctrl+c
    signal::ctrl_c().await?;
    Ok(())
}
