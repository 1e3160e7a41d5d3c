// Library entry point for fallback-quoter

pub mod config;
pub mod engine;
pub mod price_cache;
pub mod registry;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use engine::QuoteEngine;
pub use price_cache::{HttpPriceFeed, PriceCache, PriceFeed};
pub use registry::{TokenPriceConfig, TokenRegistry};
pub use types::{Network, QuoteRequest, QuoteResponse, SwapMode};
