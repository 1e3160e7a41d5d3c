//! Common types, enums, error handling, data models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common error type for the fallback-quoter system.
///
/// Quote and price lookups deliberately do not use this: they signal
/// "no answer" with `None` so a degraded price feed can never take the
/// caller down with it. This covers setup paths only.
#[derive(Debug, Error)]
pub enum QuoterError {
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Price feed error: {0}")]
    PriceFeedError(String),
}

pub type Result<T> = std::result::Result<T, QuoterError>;

/// Networks the static token table is populated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Devnet,
    Testnet,
}

impl FromStr for Network {
    type Err = QuoterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(QuoterError::ConfigError(format!(
                "unknown network: {other}"
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Devnet => write!(f, "devnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Which side of the swap the requester fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapMode {
    ExactIn,
    ExactOut,
}

impl FromStr for SwapMode {
    type Err = QuoterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ExactIn" => Ok(SwapMode::ExactIn),
            "ExactOut" => Ok(SwapMode::ExactOut),
            other => Err(QuoterError::ConfigError(format!(
                "unknown swap mode: {other} (expected ExactIn or ExactOut)"
            ))),
        }
    }
}

/// A swap quote request, amounts in the token's smallest unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
    pub network: Network,
    pub swap_mode: SwapMode,
}

/// Quote result, wire-compatible with the aggregator's quote response so
/// downstream consumers need not care which source produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    /// Worst-case bound after slippage: minimum received for ExactIn,
    /// maximum paid for ExactOut.
    pub other_amount_threshold: String,
    pub swap_mode: SwapMode,
    pub slippage_bps: u16,
    /// Always "0": the fallback models no order-book depth.
    pub price_impact_pct: String,
    pub route_plan: Vec<RoutePlanStep>,
    /// USD value of the swap as a decimal string, 6 fractional digits max,
    /// trailing zeros trimmed.
    pub swap_usd_value_micros: String,
}

/// One hop of the route plan. The fallback always emits a single
/// synthetic hop labeled as such.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub amm_key: String,
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    pub fee_amount: String,
    pub fee_mint: String,
}
