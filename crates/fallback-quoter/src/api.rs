use std::str::FromStr;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::engine::QuoteEngine;
use crate::types::{Network, QuoteRequest, QuoteResponse, SwapMode};

/// Simple JSON schema returned from /health
#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
}

/// Query params for /quote, matching the aggregator's parameter names so
/// front-end callers can point at either endpoint unchanged.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteParams {
    input_mint: String,
    output_mint: String,
    amount: u64,
    slippage_bps: Option<u16>,
    swap_mode: Option<String>,
    network: Option<String>,
}

pub struct ApiServer {
    engine: Arc<QuoteEngine>,
    default_network: Network,
    default_slippage_bps: u16,
}

impl ApiServer {
    pub fn new(engine: Arc<QuoteEngine>, default_network: Network, default_slippage_bps: u16) -> Self {
        Self {
            engine,
            default_network,
            default_slippage_bps,
        }
    }

    pub async fn start(self, addr: &str) {
        let engine = self.engine.clone();
        let default_network = self.default_network;
        let default_slippage_bps = self.default_slippage_bps;

        // /health endpoint
        let health_route =
            Router::new().route("/health", get(|| async { Json(HealthResp { status: "ok" }) }));

        // /quote endpoint; 404 means "no fallback quote available" and the
        // caller should surface the original aggregator error instead.
        let quote_route = Router::new().route(
            "/quote",
            get(move |Query(params): Query<QuoteParams>| {
                let engine = engine.clone();
                async move {
                    let network = match params.network {
                        Some(ref s) => match Network::from_str(s) {
                            Ok(n) => n,
                            Err(_) => return Err(StatusCode::BAD_REQUEST),
                        },
                        None => default_network,
                    };
                    let swap_mode = match params.swap_mode {
                        Some(ref s) => match SwapMode::from_str(s) {
                            Ok(m) => m,
                            Err(_) => return Err(StatusCode::BAD_REQUEST),
                        },
                        None => SwapMode::ExactIn,
                    };
                    let request = QuoteRequest {
                        input_mint: params.input_mint,
                        output_mint: params.output_mint,
                        amount: params.amount,
                        slippage_bps: params.slippage_bps.unwrap_or(default_slippage_bps),
                        network,
                        swap_mode,
                    };
                    match engine.build_fallback_quote(&request).await {
                        Some(quote) => Ok::<Json<QuoteResponse>, StatusCode>(Json(quote)),
                        None => Err(StatusCode::NOT_FOUND),
                    }
                }
            }),
        );

        // Combine routes
        let app = health_route.merge(quote_route);

        let addr: std::net::SocketAddr = addr.parse().expect("invalid addr");
        tracing::info!("Starting API server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.expect("bind failed");
        axum::serve(listener, app).await.expect("server failed");
    }
}
