// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Each server owns a [`Metrics`] registry. Provider and cache gauges are read
//! from the failover clients at scrape time; the request counter is updated by
//! [`track_requests`].

use api_client::ProviderHealthSnapshot;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use external_apis::CacheStats;
use prometheus::{
    Encoder, GaugeVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::{error::ServerResult, state::ServerState};

/// Dashboard metric families
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    provider_failures: IntGaugeVec,
    provider_demoted: IntGaugeVec,
    cache_entries: IntGaugeVec,
    cache_hits: IntGaugeVec,
    cache_misses: IntGaugeVec,
    cache_hit_rate: GaugeVec,
    poller_subscribers: IntGaugeVec,
}

impl Metrics {
    /// Create and register every metric family
    ///
    /// # Errors
    ///
    /// Returns an error if a family is malformed or registered twice.
    pub fn new() -> ServerResult<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("dashboard_http_requests_total", "HTTP requests by route and status"),
            &["route", "status"],
        )?;
        let provider_failures = IntGaugeVec::new(
            Opts::new(
                "dashboard_provider_consecutive_failures",
                "Consecutive failures per upstream provider",
            ),
            &["upstream", "provider"],
        )?;
        let provider_demoted = IntGaugeVec::new(
            Opts::new(
                "dashboard_provider_demoted",
                "1 if the provider is tried after healthy ones",
            ),
            &["upstream", "provider"],
        )?;
        let cache_entries = IntGaugeVec::new(
            Opts::new("dashboard_cache_entries", "Cached responses per upstream"),
            &["upstream"],
        )?;
        let cache_hits = IntGaugeVec::new(
            Opts::new("dashboard_cache_hits", "Cache hits since start"),
            &["upstream"],
        )?;
        let cache_misses = IntGaugeVec::new(
            Opts::new("dashboard_cache_misses", "Cache misses since start"),
            &["upstream"],
        )?;
        let cache_hit_rate = GaugeVec::new(
            Opts::new("dashboard_cache_hit_rate", "Cache hit rate (0.0 to 1.0)"),
            &["upstream"],
        )?;
        let poller_subscribers = IntGaugeVec::new(
            Opts::new("dashboard_poller_subscribers", "Live subscribers per poller"),
            &["poller"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(provider_failures.clone()))?;
        registry.register(Box::new(provider_demoted.clone()))?;
        registry.register(Box::new(cache_entries.clone()))?;
        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(cache_misses.clone()))?;
        registry.register(Box::new(cache_hit_rate.clone()))?;
        registry.register(Box::new(poller_subscribers.clone()))?;

        Ok(Self {
            registry,
            requests,
            provider_failures,
            provider_demoted,
            cache_entries,
            cache_hits,
            cache_misses,
            cache_hit_rate,
            poller_subscribers,
        })
    }

    /// Count one handled request
    pub fn inc_request(&self, route: &str, status: StatusCode) {
        self.requests
            .with_label_values(&[route, status.as_str()])
            .inc();
    }

    /// Update provider gauges of one upstream
    pub fn record_health(&self, upstream: &str, snapshot: &[ProviderHealthSnapshot]) {
        for provider in snapshot {
            let labels = [upstream, provider.provider.as_str()];
            self.provider_failures
                .with_label_values(&labels)
                .set(i64::from(provider.consecutive_failures));
            self.provider_demoted
                .with_label_values(&labels)
                .set(i64::from(provider.is_demoted()));
        }
    }

    /// Update cache gauges of one upstream
    pub fn record_cache(&self, upstream: &str, stats: &CacheStats) {
        let labels = [upstream];
        self.cache_entries
            .with_label_values(&labels)
            .set(i64::try_from(stats.entry_count).unwrap_or(i64::MAX));
        self.cache_hits
            .with_label_values(&labels)
            .set(i64::try_from(stats.hits).unwrap_or(i64::MAX));
        self.cache_misses
            .with_label_values(&labels)
            .set(i64::try_from(stats.misses).unwrap_or(i64::MAX));
        self.cache_hit_rate
            .with_label_values(&labels)
            .set(stats.hit_rate);
    }

    /// Update the subscriber gauge of one poller
    pub fn record_subscribers(&self, poller: &str, subscribers: usize) {
        self.poller_subscribers
            .with_label_values(&[poller])
            .set(i64::try_from(subscribers).unwrap_or(i64::MAX));
    }

    /// Encode every family in the Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> ServerResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = String::new();
        encoder.encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Middleware counting requests by matched route and status
pub async fn track_requests(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |m| m.as_str().to_string());
    let response = next.run(request).await;
    state.metrics().inc_request(&route, response.status());
    response
}

/// Export metrics in the Prometheus text format
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    summary = "Prometheus metrics",
    responses(
        (status = 200, description = "Metrics in text exposition format", body = String)
    )
)]
pub async fn metrics_handler(State(state): State<ServerState>) -> ServerResult<Response> {
    state.refresh_metrics();
    let body = state.metrics().encode()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
        body,
    )
        .into_response())
}
