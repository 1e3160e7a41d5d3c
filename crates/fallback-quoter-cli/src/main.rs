use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fallback_quoter::config::AppConfig;
use fallback_quoter::price_cache::{HttpPriceFeed, PriceCache, DEFAULT_PRICE_TTL};
use fallback_quoter::registry::TokenRegistry;
use fallback_quoter::types::QuoteRequest;
use fallback_quoter::QuoteEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    // Load AppConfig using load_with_cli to respect CLI args, file, and env vars
    let config = AppConfig::load_with_cli();

    let input_mint = config
        .input_mint
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--input-mint is required"))?;
    let output_mint = config
        .output_mint
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--output-mint is required"))?;
    let amount = config
        .amount
        .ok_or_else(|| anyhow::anyhow!("--amount is required (raw smallest-unit integer)"))?;

    let feed = Arc::new(HttpPriceFeed::new(config.price_feed_url.clone()));
    let ttl = config
        .price_ttl_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PRICE_TTL);
    let prices = PriceCache::with_ttl(feed, ttl);
    let engine = QuoteEngine::new(TokenRegistry::with_defaults(), prices);

    let request = QuoteRequest {
        input_mint,
        output_mint,
        amount,
        slippage_bps: config.slippage_bps,
        network: config.network,
        swap_mode: config.swap_mode,
    };

    match engine.build_fallback_quote(&request).await {
        Some(quote) => {
            println!("{}", serde_json::to_string_pretty(&quote)?);
            println!(
                "\n{:?} {} {} -> {} {} (worst case {}, {} bps, ~${})",
                quote.swap_mode,
                quote.in_amount,
                quote.input_mint,
                quote.out_amount,
                quote.output_mint,
                quote.other_amount_threshold,
                quote.slippage_bps,
                quote.swap_usd_value_micros,
            );
            Ok(())
        }
        None => anyhow::bail!(
            "no fallback quote available for {} -> {} on {}",
            request.input_mint,
            request.output_mint,
            request.network
        ),
    }
}
