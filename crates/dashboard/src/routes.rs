// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration for the dashboard.

pub mod handlers;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use handlers::{
    churns_handler, clear_cache_handler, exchange_rates_handler, health_handler,
    inbound_address_handler, mimir_handler, network_handler, nodes_handler, pool_handler,
    pools_handler, reset_failures_handler, rune_price_handler,
};

use crate::{
    metrics::{metrics_handler, track_requests},
    openapi::openapi_spec,
    state::ServerState,
};

/// Create application routes
///
/// Every route except `/metrics` is counted by the request metrics.
pub fn create_routes(state: &ServerState) -> Router<ServerState> {
    let health_routes = Router::new().route("/health", get(health_handler));

    let docs_routes = Router::new().route("/api-doc/openapi.json", get(openapi_spec));

    let api_routes = Router::new()
        .route("/rune-price", get(rune_price_handler))
        .route("/pools", get(pools_handler))
        .route("/pools/{asset}", get(pool_handler))
        .route("/network", get(network_handler))
        .route("/nodes", get(nodes_handler))
        .route("/mimir/{key}", get(mimir_handler))
        .route("/inbound-addresses/{chain}", get(inbound_address_handler))
        .route("/churns", get(churns_handler))
        .route("/exchange-rates", get(exchange_rates_handler));

    let admin_routes = Router::new()
        .route("/cache/clear", post(clear_cache_handler))
        .route("/failures/reset", post(reset_failures_handler));

    let tracked = Router::new()
        .merge(health_routes)
        .merge(docs_routes)
        .nest("/v1", api_routes)
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests));

    Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(tracked)
}
