//! Fallback quote computation over static and cached prices.

use tracing::{debug, warn};

use crate::price_cache::PriceCache;
use crate::registry::{TokenPriceConfig, TokenRegistry};
use crate::types::{QuoteRequest, QuoteResponse, RoutePlanStep, SwapInfo, SwapMode};

/// Synthetic venue identifiers for the single-hop fallback route.
const FALLBACK_AMM_KEY: &str = "fallback";
const FALLBACK_ROUTE_LABEL: &str = "Fallback Price Oracle";

/// Micro-USD per whole USD, the fixed-point precision for price math.
const USD_MICROS: u128 = 1_000_000;
const BPS_DENOMINATOR: u128 = 10_000;

/// Deterministic fallback quoter.
///
/// Used when the remote aggregator is down or erroring. Prices come from
/// the cache when a live value is known and from the static registry
/// otherwise; all amount math is unsigned integer fixed-point. The engine
/// holds no mutable state of its own, so a quote is a pure function of
/// the request and the current cache contents.
pub struct QuoteEngine {
    registry: TokenRegistry,
    prices: PriceCache,
}

impl QuoteEngine {
    pub fn new(registry: TokenRegistry, prices: PriceCache) -> Self {
        Self { registry, prices }
    }

    /// Build a best-effort quote, or `None` when no fallback is possible:
    /// unsupported network, unknown mint, zero amount, zero resolved
    /// price, or amounts too large for 128-bit intermediate math.
    pub async fn build_fallback_quote(&self, request: &QuoteRequest) -> Option<QuoteResponse> {
        if !self.registry.supports(request.network) {
            warn!("no token table for network {}", request.network);
            return None;
        }
        let input = match self.registry.get(request.network, &request.input_mint) {
            Some(cfg) => cfg,
            None => {
                debug!("input mint {} not in token table", request.input_mint);
                return None;
            }
        };
        let output = match self.registry.get(request.network, &request.output_mint) {
            Some(cfg) => cfg,
            None => {
                debug!("output mint {} not in token table", request.output_mint);
                return None;
            }
        };
        if request.amount == 0 {
            return None;
        }

        // Both price resolutions are issued concurrently; completion
        // order does not affect the result.
        let (input_price, output_price) =
            tokio::join!(self.resolve_price(input), self.resolve_price(output));
        let input_micro = to_micro_usd(input_price)?;
        let output_micro = to_micro_usd(output_price)?;

        let input_pow = pow10(input.decimals)?;
        let output_pow = pow10(output.decimals)?;
        let amount = u128::from(request.amount);

        // ExactIn truncates at every step: never promise more output than
        // the prices justify. ExactOut rounds up at every step: never
        // understate what the requester must pay.
        let (in_amount, out_amount, value_micro_usd) = match request.swap_mode {
            SwapMode::ExactIn => {
                let value = amount.checked_mul(input_micro)? / input_pow;
                let out = value.checked_mul(output_pow)? / output_micro;
                (amount, out, value)
            }
            SwapMode::ExactOut => {
                let value = ceil_div(amount.checked_mul(output_micro)?, output_pow);
                let required_in = ceil_div(value.checked_mul(input_pow)?, input_micro);
                (required_in, amount, value)
            }
        };

        let other_amount_threshold = match request.swap_mode {
            SwapMode::ExactIn => slippage_floor(out_amount, request.slippage_bps)?,
            SwapMode::ExactOut => slippage_ceil(in_amount, request.slippage_bps)?,
        };

        Some(QuoteResponse {
            input_mint: request.input_mint.clone(),
            in_amount: in_amount.to_string(),
            output_mint: request.output_mint.clone(),
            out_amount: out_amount.to_string(),
            other_amount_threshold: other_amount_threshold.to_string(),
            swap_mode: request.swap_mode,
            slippage_bps: request.slippage_bps,
            price_impact_pct: "0".to_string(),
            route_plan: vec![RoutePlanStep {
                swap_info: SwapInfo {
                    amm_key: FALLBACK_AMM_KEY.to_string(),
                    label: FALLBACK_ROUTE_LABEL.to_string(),
                    input_mint: request.input_mint.clone(),
                    output_mint: request.output_mint.clone(),
                    in_amount: in_amount.to_string(),
                    out_amount: out_amount.to_string(),
                    fee_amount: "0".to_string(),
                    fee_mint: request.input_mint.clone(),
                },
                percent: 100,
            }],
            swap_usd_value_micros: format_usd_micros(value_micro_usd),
        })
    }

    /// Live USD price for a token, falling back to its static reference.
    ///
    /// Walks the alias list in order through the cache; the first hit is
    /// fanned out to every alias so a later lookup under any of them is
    /// an immediate cache hit.
    async fn resolve_price(&self, token: &TokenPriceConfig) -> f64 {
        for id in &token.price_ids {
            if let Some(price) = self.prices.get_price(id).await {
                for alias in &token.price_ids {
                    self.prices.set_price(alias, price);
                }
                debug!("live price for {}: {}", token.symbol, price);
                return price;
            }
        }
        debug!(
            "no live price for {}, using reference {}",
            token.symbol, token.reference_price_usd
        );
        token.reference_price_usd
    }
}

/// `None` for decimals beyond what u128 can scale (the table never goes
/// past 18, but the registry accepts any u8).
fn pow10(decimals: u8) -> Option<u128> {
    10u128.checked_pow(u32::from(decimals))
}

fn ceil_div(numerator: u128, denominator: u128) -> u128 {
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// USD price to integer micro-USD per whole token, rounded to nearest.
/// Prices that round to zero are rejected so they can never reach a
/// division.
fn to_micro_usd(price: f64) -> Option<u128> {
    let micros = (price * USD_MICROS as f64).round();
    if micros.is_finite() && micros >= 1.0 {
        Some(micros as u128)
    } else {
        None
    }
}

/// Minimum received after slippage: rounds down, saturating at zero for
/// slippage at or beyond 100%.
fn slippage_floor(amount: u128, slippage_bps: u16) -> Option<u128> {
    if slippage_bps == 0 || amount == 0 {
        return Some(amount);
    }
    let keep = BPS_DENOMINATOR.saturating_sub(u128::from(slippage_bps));
    Some(amount.checked_mul(keep)? / BPS_DENOMINATOR)
}

/// Maximum paid after slippage: rounds up.
fn slippage_ceil(amount: u128, slippage_bps: u16) -> Option<u128> {
    if slippage_bps == 0 || amount == 0 {
        return Some(amount);
    }
    let pay = BPS_DENOMINATOR + u128::from(slippage_bps);
    Some(ceil_div(amount.checked_mul(pay)?, BPS_DENOMINATOR))
}

/// Micro-USD to a decimal USD string, trailing fractional zeros trimmed
/// and the fraction omitted entirely when zero.
fn format_usd_micros(micros: u128) -> String {
    let whole = micros / USD_MICROS;
    let frac = micros % USD_MICROS;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac = format!("{frac:06}");
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow10_rejects_unscalable_decimals() {
        assert_eq!(pow10(0), Some(1));
        assert_eq!(pow10(9), Some(1_000_000_000));
        assert_eq!(pow10(18), Some(1_000_000_000_000_000_000));
        assert_eq!(pow10(39), None);
        assert_eq!(pow10(u8::MAX), None);
    }

    #[test]
    fn ceil_div_rounds_up_only_on_remainder() {
        assert_eq!(ceil_div(10, 5), 2);
        assert_eq!(ceil_div(11, 5), 3);
        assert_eq!(ceil_div(0, 5), 0);
    }

    #[test]
    fn micro_usd_conversion() {
        assert_eq!(to_micro_usd(170.0), Some(170_000_000));
        assert_eq!(to_micro_usd(0.000025), Some(25));
        // Rounds to nearest, not down.
        assert_eq!(to_micro_usd(0.0000017), Some(2));
        // Too small to represent, or outright invalid.
        assert_eq!(to_micro_usd(0.0000001), None);
        assert_eq!(to_micro_usd(0.0), None);
        assert_eq!(to_micro_usd(-1.0), None);
        assert_eq!(to_micro_usd(f64::NAN), None);
    }

    #[test]
    fn slippage_bounds_move_against_requester() {
        assert_eq!(slippage_floor(170_000_000, 50), Some(169_150_000));
        assert_eq!(slippage_ceil(1_000_000_000, 50), Some(1_005_000_000));
        // Zero slippage leaves the base untouched.
        assert_eq!(slippage_floor(12_345, 0), Some(12_345));
        assert_eq!(slippage_ceil(12_345, 0), Some(12_345));
        // 100%+ slippage floors at zero rather than underflowing.
        assert_eq!(slippage_floor(1_000, 10_000), Some(0));
        assert_eq!(slippage_floor(1_000, 12_000), Some(0));
    }

    #[test]
    fn usd_micros_formatting() {
        assert_eq!(format_usd_micros(170_000_000), "170");
        assert_eq!(format_usd_micros(170_500_000), "170.5");
        assert_eq!(format_usd_micros(1), "0.000001");
        assert_eq!(format_usd_micros(0), "0");
        assert_eq!(format_usd_micros(1_234_567), "1.234567");
    }
}
