// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Handlers read the pollers when they hold a value and fall back to a
//! one-shot fetch otherwise. Everything else goes straight to the typed
//! clients, which serve from their cache when the entry is live.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use external_apis::{
    ExchangeRates, RequestOptions,
    midgard::Churn,
    thornode::{InboundAddress, NetworkInfo, Node, Pool},
};
use pollers::{PoolSet, PriceDirection, PricePoint, RunePrice};
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Chain};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ServerError, ServerResult},
    extractors::{PathExtractor, QueryExtractor},
    state::{HealthCheck, HealthStatus, ServerState},
};

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the service version and environment, the tracked health of every THORNode and Midgard provider, and the activity of the background pollers. No upstream request is made.",
    responses(
        (status = 200, description = "Service is up or degraded", body = HealthCheck),
        (status = 503, description = "Every provider of some upstream is demoted", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let health = state.health_check();
    let status = match health.status {
        HealthStatus::Down { .. } => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Up | HealthStatus::Degraded { .. } => StatusCode::OK,
    };
    (status, Json(health))
}

/// Latest RUNE price with its recent history
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunePriceResponse {
    /// Latest price in USD
    pub price_usd: f64,
    /// Price of the previous sample
    pub previous_usd: Option<f64>,
    /// `up`, `down` or `neutral`
    #[schema(value_type = String)]
    pub direction: PriceDirection,
    /// Change from the oldest sample in the window, in percent
    pub change_percent: Option<f64>,
    /// Samples within the window, oldest first
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<PricePoint>,
    /// Time of the last successful fetch
    pub last_update: Option<DateTime<Utc>>,
    /// Error of the latest fetch if it failed after this value was published
    pub last_error: Option<String>,
}

impl RunePriceResponse {
    fn new(price: RunePrice, last_update: Option<DateTime<Utc>>, last_error: Option<String>) -> Self {
        Self {
            change_percent: price.window_change_percent(),
            price_usd: price.price_usd,
            previous_usd: price.previous_usd,
            direction: price.direction,
            history: price.history,
            last_update,
            last_error,
        }
    }
}

/// Current RUNE price
#[utoipa::path(
    get,
    path = "/v1/rune-price",
    tag = "prices",
    summary = "RUNE price in USD",
    description = "Served from the RUNE price poller. Before the first poll completes the price is fetched once from THORNode.",
    responses(
        (status = 200, description = "Current price", body = RunePriceResponse),
        (status = 502, description = "Every THORNode provider failed", body = String)
    )
)]
pub async fn rune_price_handler(
    State(state): State<ServerState>,
) -> ServerResult<Json<RunePriceResponse>> {
    let poller = state.rune_price();
    let current = poller.state();
    let last_error = current.error.map(|e| e.to_string());
    let response = match current.value {
        Some(price) => RunePriceResponse::new(price, current.last_update, last_error),
        None => {
            let price = poller.force_refresh().await?;
            RunePriceResponse::new(price, poller.state().last_update, None)
        }
    };
    Ok(Json(response))
}

/// Pool list with aggregates
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolsResponse {
    /// Pools open for swaps
    pub available_count: usize,
    /// Pools in any state
    pub total_count: usize,
    /// RUNE depth across available pools, in base units
    pub total_rune_depth: u128,
    /// Pools in upstream order
    #[schema(value_type = Vec<Object>)]
    pub pools: Vec<Pool>,
}

impl From<PoolSet> for PoolsResponse {
    fn from(set: PoolSet) -> Self {
        Self {
            available_count: set.available_count(),
            total_count: set.total_count(),
            total_rune_depth: set.total_rune_depth(),
            pools: set.pools,
        }
    }
}

/// Every pool
#[utoipa::path(
    get,
    path = "/v1/pools",
    tag = "pools",
    summary = "All pools",
    description = "Served from the pools poller, which prefers the secondary THORNode provider.",
    responses(
        (status = 200, description = "Pool list", body = PoolsResponse),
        (status = 502, description = "Every THORNode provider failed", body = String)
    )
)]
pub async fn pools_handler(State(state): State<ServerState>) -> ServerResult<Json<PoolsResponse>> {
    let poller = state.pools();
    let set = match poller.state().value {
        Some(set) => set,
        None => poller.force_refresh().await?,
    };
    Ok(Json(set.into()))
}

/// Optional block height
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HeightQuery {
    /// Query the archive at this height
    pub height: Option<u64>,
}

/// One pool, optionally at a past height
#[utoipa::path(
    get,
    path = "/v1/pools/{asset}",
    tag = "pools",
    summary = "One pool",
    params(
        ("asset" = String, Path, description = "Asset identifier such as BTC.BTC"),
        HeightQuery
    ),
    responses(
        (status = 200, description = "Pool state", body = Object),
        (status = 400, description = "Malformed asset or height", body = String),
        (status = 502, description = "Every eligible provider failed", body = String),
        (status = 503, description = "No provider serves the requested height", body = String)
    )
)]
pub async fn pool_handler(
    State(state): State<ServerState>,
    PathExtractor(asset): PathExtractor<String>,
    QueryExtractor(query): QueryExtractor<HeightQuery>,
) -> ServerResult<Json<Pool>> {
    let asset: Asset = asset
        .parse()
        .map_err(|e| ServerError::ValidationError(format!("{e}")))?;
    let options = query
        .height
        .map_or_else(RequestOptions::default, RequestOptions::at_height);
    let pool = state.thornode().pool(&asset.to_string(), options).await?;
    Ok(Json(pool))
}

/// Network parameters
#[utoipa::path(
    get,
    path = "/v1/network",
    tag = "network",
    summary = "Network parameters",
    responses(
        (status = 200, description = "Network parameters", body = Object),
        (status = 502, description = "Every THORNode provider failed", body = String)
    )
)]
pub async fn network_handler(State(state): State<ServerState>) -> ServerResult<Json<NetworkInfo>> {
    Ok(Json(state.thornode().network(RequestOptions::default()).await?))
}

/// Node operators with counts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NodesResponse {
    /// Nodes in the active set
    pub active_count: usize,
    /// Nodes in any state
    pub total_count: usize,
    /// Node records
    #[schema(value_type = Vec<Object>)]
    pub nodes: Vec<Node>,
}

/// Node operators
#[utoipa::path(
    get,
    path = "/v1/nodes",
    tag = "network",
    summary = "Node operators",
    responses(
        (status = 200, description = "Node list", body = NodesResponse),
        (status = 502, description = "Every THORNode provider failed", body = String)
    )
)]
pub async fn nodes_handler(State(state): State<ServerState>) -> ServerResult<Json<NodesResponse>> {
    let nodes = state.thornode().nodes(RequestOptions::default()).await?;
    Ok(Json(NodesResponse {
        active_count: nodes.iter().filter(|n| n.is_active()).count(),
        total_count: nodes.len(),
        nodes,
    }))
}

/// One mimir value
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MimirResponse {
    /// Mimir key
    pub key: String,
    /// Raw value as returned by THORNode
    pub value: String,
}

/// Mimir value by key
#[utoipa::path(
    get,
    path = "/v1/mimir/{key}",
    tag = "network",
    summary = "Mimir value",
    params(("key" = String, Path, description = "Mimir key such as HALTTRADING")),
    responses(
        (status = 200, description = "Mimir value", body = MimirResponse),
        (status = 502, description = "Every THORNode provider failed", body = String)
    )
)]
pub async fn mimir_handler(
    State(state): State<ServerState>,
    PathExtractor(key): PathExtractor<String>,
) -> ServerResult<Json<MimirResponse>> {
    let value = state.thornode().mimir(&key, RequestOptions::default()).await?;
    Ok(Json(MimirResponse { key, value }))
}

/// Inbound vault of one chain
#[utoipa::path(
    get,
    path = "/v1/inbound-addresses/{chain}",
    tag = "network",
    summary = "Inbound address",
    params(("chain" = String, Path, description = "Chain identifier such as BTC")),
    responses(
        (status = 200, description = "Inbound address", body = Object),
        (status = 400, description = "Unknown chain", body = String),
        (status = 404, description = "Chain has no inbound address", body = String),
        (status = 502, description = "Every THORNode provider failed", body = String)
    )
)]
pub async fn inbound_address_handler(
    State(state): State<ServerState>,
    PathExtractor(chain): PathExtractor<String>,
) -> ServerResult<Json<InboundAddress>> {
    let chain: Chain = chain
        .parse()
        .map_err(|e| ServerError::ValidationError(format!("{e}")))?;
    state
        .thornode()
        .inbound_address(chain, RequestOptions::default())
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("inbound address for {chain}")))
}

/// Churn history
#[utoipa::path(
    get,
    path = "/v1/churns",
    tag = "network",
    summary = "Churn history",
    responses(
        (status = 200, description = "Churns, newest first", body = Vec<Object>),
        (status = 502, description = "Every Midgard provider failed", body = String)
    )
)]
pub async fn churns_handler(State(state): State<ServerState>) -> ServerResult<Json<Vec<Churn>>> {
    Ok(Json(state.midgard().churns(RequestOptions::default()).await?))
}

/// RUNE fiat rates
#[utoipa::path(
    get,
    path = "/v1/exchange-rates",
    tag = "prices",
    summary = "RUNE exchange rates",
    description = "RUNE price in USD, EUR, GBP and JPY from the spot price provider.",
    responses(
        (status = 200, description = "Rates", body = Object),
        (status = 502, description = "Spot price provider failed or is rate limiting", body = String),
        (status = 503, description = "Spot prices are disabled", body = String),
        (status = 504, description = "Spot price provider timed out", body = String)
    )
)]
pub async fn exchange_rates_handler(
    State(state): State<ServerState>,
) -> ServerResult<Json<ExchangeRates>> {
    let client = state
        .spot_prices()
        .ok_or(ServerError::Disabled { name: "spot prices" })?;
    Ok(Json(client.exchange_rates().await?))
}

/// Result of an admin action
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminResponse {
    /// What was done
    pub message: String,
}

/// Drop every cached upstream response
#[utoipa::path(
    post,
    path = "/admin/cache/clear",
    tag = "admin",
    summary = "Clear response caches",
    responses((status = 200, description = "Caches cleared", body = AdminResponse))
)]
pub async fn clear_cache_handler(State(state): State<ServerState>) -> Json<AdminResponse> {
    state.clear_caches();
    info!("response caches cleared");
    Json(AdminResponse {
        message: "response caches cleared".to_string(),
    })
}

/// Zero every provider failure counter
#[utoipa::path(
    post,
    path = "/admin/failures/reset",
    tag = "admin",
    summary = "Reset provider failures",
    responses((status = 200, description = "Counters reset", body = AdminResponse))
)]
pub async fn reset_failures_handler(State(state): State<ServerState>) -> Json<AdminResponse> {
    state.reset_failures();
    info!("provider failure counters reset");
    Json(AdminResponse {
        message: "provider failure counters reset".to_string(),
    })
}
