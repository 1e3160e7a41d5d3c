//! Configuration loading, env vars, CLI flags.

use std::env;
use std::str::FromStr;

use serde::Deserialize;
use tracing::info;

use crate::types::{Network, SwapMode};

#[cfg(feature = "cli")]
use clap::Parser;

const DEFAULT_PRICE_FEED_URL: &str = "https://lite-api.jup.ag/price/v2";
const DEFAULT_SLIPPAGE_BPS: u16 = 50;
const DEFAULT_API_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone)]
pub struct AppConfig {
    pub network: Network,
    pub price_feed_url: String,
    /// Overrides the cache's 60 s default when set.
    pub price_ttl_secs: Option<u64>,
    pub slippage_bps: u16,
    pub api_addr: String,
    // One-shot quote parameters, CLI mode only.
    pub input_mint: Option<String>,
    pub output_mint: Option<String>,
    pub amount: Option<u64>,
    pub swap_mode: SwapMode,
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub network: Option<String>,
    pub price_feed_url: Option<String>,
    pub price_ttl_secs: Option<u64>,
    pub slippage_bps: Option<u16>,
    pub api_addr: Option<String>,
    pub input_mint: Option<String>,
    pub output_mint: Option<String>,
    pub amount: Option<u64>,
    pub swap_mode: Option<String>,
}

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliConfig {
    #[arg(long)]
    pub config: Option<String>,
    #[arg(long)]
    pub network: Option<String>,
    #[arg(long)]
    pub price_feed_url: Option<String>,
    #[arg(long)]
    pub price_ttl_secs: Option<u64>,
    #[arg(long)]
    pub slippage_bps: Option<u16>,
    #[arg(long)]
    pub api_addr: Option<String>,
    #[arg(long)]
    pub input_mint: Option<String>,
    #[arg(long)]
    pub output_mint: Option<String>,
    #[arg(long)]
    pub amount: Option<u64>,
    #[arg(long)]
    pub swap_mode: Option<String>,
}

impl AppConfig {
    /// Env-var-only load, used by the API binary.
    pub fn load() -> Self {
        let network = env::var("NETWORK")
            .ok()
            .and_then(|s| Network::from_str(&s).ok())
            .unwrap_or(Network::Mainnet);
        let price_feed_url =
            env::var("PRICE_FEED_URL").unwrap_or_else(|_| DEFAULT_PRICE_FEED_URL.to_string());
        let price_ttl_secs = env::var("PRICE_TTL_SECS").ok().and_then(|s| s.parse().ok());
        let slippage_bps = env::var("SLIPPAGE_BPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SLIPPAGE_BPS);
        let api_addr = env::var("API_ADDR").unwrap_or_else(|_| DEFAULT_API_ADDR.to_string());
        let swap_mode = env::var("SWAP_MODE")
            .ok()
            .and_then(|s| SwapMode::from_str(&s).ok())
            .unwrap_or(SwapMode::ExactIn);

        if env::var("PRICE_FEED_URL").is_err() {
            info!("PRICE_FEED_URL not set, using {}", DEFAULT_PRICE_FEED_URL);
        }

        Self {
            network,
            price_feed_url,
            price_ttl_secs,
            slippage_bps,
            api_addr,
            input_mint: env::var("INPUT_MINT").ok(),
            output_mint: env::var("OUTPUT_MINT").ok(),
            amount: env::var("AMOUNT").ok().and_then(|s| s.parse().ok()),
            swap_mode,
        }
    }

    /// Layered load: CLI flags over config file over env vars.
    #[cfg(feature = "cli")]
    pub fn load_with_cli() -> Self {
        let cli = CliConfig::parse();
        let mut file_config = FileConfig {
            network: None,
            price_feed_url: None,
            price_ttl_secs: None,
            slippage_bps: None,
            api_addr: None,
            input_mint: None,
            output_mint: None,
            amount: None,
            swap_mode: None,
        };
        if let Some(ref path) = cli.config {
            if let Ok(contents) = std::fs::read_to_string(path) {
                if let Ok(cfg) = toml::from_str::<FileConfig>(&contents) {
                    file_config = cfg;
                }
            }
        }

        let network = cli
            .network
            .or(file_config.network)
            .or(env::var("NETWORK").ok())
            .and_then(|s| Network::from_str(&s).ok())
            .unwrap_or(Network::Mainnet);
        let price_feed_url = cli
            .price_feed_url
            .or(file_config.price_feed_url)
            .or(env::var("PRICE_FEED_URL").ok())
            .unwrap_or_else(|| DEFAULT_PRICE_FEED_URL.to_string());
        let price_ttl_secs = cli
            .price_ttl_secs
            .or(file_config.price_ttl_secs)
            .or(env::var("PRICE_TTL_SECS").ok().and_then(|s| s.parse().ok()));
        let slippage_bps = cli
            .slippage_bps
            .or(file_config.slippage_bps)
            .or(env::var("SLIPPAGE_BPS").ok().and_then(|s| s.parse().ok()))
            .unwrap_or(DEFAULT_SLIPPAGE_BPS);
        let api_addr = cli
            .api_addr
            .or(file_config.api_addr)
            .or(env::var("API_ADDR").ok())
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string());
        let input_mint = cli
            .input_mint
            .or(file_config.input_mint)
            .or(env::var("INPUT_MINT").ok());
        let output_mint = cli
            .output_mint
            .or(file_config.output_mint)
            .or(env::var("OUTPUT_MINT").ok());
        let amount = cli
            .amount
            .or(file_config.amount)
            .or(env::var("AMOUNT").ok().and_then(|s| s.parse().ok()));
        let swap_mode = cli
            .swap_mode
            .or(file_config.swap_mode)
            .or(env::var("SWAP_MODE").ok())
            .and_then(|s| SwapMode::from_str(&s).ok())
            .unwrap_or(SwapMode::ExactIn);

        Self {
            network,
            price_feed_url,
            price_ttl_secs,
            slippage_bps,
            api_addr,
            input_mint,
            output_mint,
            amount,
            swap_mode,
        }
    }
}
