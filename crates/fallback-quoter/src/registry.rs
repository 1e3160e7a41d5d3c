//! Static per-network token price table.

use std::collections::HashMap;

use crate::types::Network;

/// Static pricing metadata for one token on one network.
///
/// `reference_price_usd` is the hardcoded last-resort price used when no
/// live price can be resolved. `price_ids` is the ordered list of aliases
/// the live price feed may know the token under (mint address first, then
/// symbol); lookups walk it in order and the first hit wins.
#[derive(Debug, Clone)]
pub struct TokenPriceConfig {
    pub symbol: String,
    pub decimals: u8,
    pub reference_price_usd: f64,
    pub price_ids: Vec<String>,
}

impl TokenPriceConfig {
    fn new(symbol: &str, decimals: u8, reference_price_usd: f64, mint: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            reference_price_usd,
            price_ids: vec![mint.to_string(), symbol.to_string()],
        }
    }
}

/// Token table keyed by (network, mint). Built once at startup and never
/// mutated afterwards; a token absent from the table means "no fallback
/// quote", never a guessed price.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    networks: HashMap<Network, HashMap<String, TokenPriceConfig>>,
}

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
pub const JUP_MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";
pub const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
pub const DEVNET_USDC_MINT: &str = "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU";
pub const TESTNET_USDC_MINT: &str = "CpMah17kQEL2wqyMKt3mZBdTnZbkbfx4nqmQMFDP5vwp";

impl TokenRegistry {
    /// Registry with the reference deployment's token set.
    pub fn with_defaults() -> Self {
        let mut networks: HashMap<Network, HashMap<String, TokenPriceConfig>> = HashMap::new();

        let mut mainnet = HashMap::new();
        for cfg in [
            TokenPriceConfig::new("SOL", 9, 170.0, SOL_MINT),
            TokenPriceConfig::new("USDC", 6, 1.0, USDC_MINT),
            TokenPriceConfig::new("USDT", 6, 1.0, USDT_MINT),
            TokenPriceConfig::new("JUP", 6, 0.85, JUP_MINT),
            TokenPriceConfig::new("BONK", 5, 0.000025, BONK_MINT),
        ] {
            mainnet.insert(cfg.price_ids[0].clone(), cfg);
        }
        networks.insert(Network::Mainnet, mainnet);

        // Test networks only carry the native/stable pair.
        let mut devnet = HashMap::new();
        for cfg in [
            TokenPriceConfig::new("SOL", 9, 170.0, SOL_MINT),
            TokenPriceConfig::new("USDC", 6, 1.0, DEVNET_USDC_MINT),
        ] {
            devnet.insert(cfg.price_ids[0].clone(), cfg);
        }
        networks.insert(Network::Devnet, devnet);

        let mut testnet = HashMap::new();
        for cfg in [
            TokenPriceConfig::new("SOL", 9, 170.0, SOL_MINT),
            TokenPriceConfig::new("USDC", 6, 1.0, TESTNET_USDC_MINT),
        ] {
            testnet.insert(cfg.price_ids[0].clone(), cfg);
        }
        networks.insert(Network::Testnet, testnet);

        Self { networks }
    }

    /// Empty registry, for callers that assemble their own table.
    pub fn new() -> Self {
        Self {
            networks: HashMap::new(),
        }
    }

    pub fn insert(&mut self, network: Network, mint: &str, config: TokenPriceConfig) {
        self.networks
            .entry(network)
            .or_default()
            .insert(mint.to_string(), config);
    }

    pub fn get(&self, network: Network, mint: &str) -> Option<&TokenPriceConfig> {
        self.networks.get(&network)?.get(mint)
    }

    pub fn supports(&self, network: Network) -> bool {
        self.networks.contains_key(&network)
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
