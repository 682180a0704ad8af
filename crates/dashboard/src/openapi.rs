// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module

use axum::Json;
use utoipa::OpenApi;

use crate::{
    config::Environment,
    metrics,
    routes::handlers::{self, AdminResponse, MimirResponse, NodesResponse, PoolsResponse, RunePriceResponse},
    state::{HealthCheck, HealthStatus, PollerHealth},
};

/// `OpenAPI` document for the dashboard
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "THORChain Dashboard API",
        description = "Cached, failover-backed views of THORNode, Midgard and spot price data"
    ),
    paths(
        handlers::health_handler,
        metrics::metrics_handler,
        handlers::rune_price_handler,
        handlers::pools_handler,
        handlers::pool_handler,
        handlers::network_handler,
        handlers::nodes_handler,
        handlers::mimir_handler,
        handlers::inbound_address_handler,
        handlers::churns_handler,
        handlers::exchange_rates_handler,
        handlers::clear_cache_handler,
        handlers::reset_failures_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        PollerHealth,
        Environment,
        RunePriceResponse,
        PoolsResponse,
        NodesResponse,
        MimirResponse,
        AdminResponse,
    )),
    tags(
        (name = "health", description = "Service health and metrics"),
        (name = "prices", description = "RUNE prices"),
        (name = "pools", description = "Liquidity pools"),
        (name = "network", description = "Network state"),
        (name = "admin", description = "Cache and provider maintenance")
    )
)]
pub struct ApiDoc;

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
