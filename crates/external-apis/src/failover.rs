// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Failover fetch client
//!
//! [`FailoverClient`] answers a [`FetchRequest`] from its cache when it can, and
//! otherwise walks the provider order chosen by the registry, one attempt per
//! provider, until one returns a 2xx body that parses. Provider failures are
//! absorbed and counted; only total exhaustion reaches the caller.

use std::time::Duration;

use api_client::{
    ApiError, FetchRequest, HttpTransport, ProviderHealthSnapshot, ResponsePayload,
    TransportRequest, DEFAULT_MAX_FAILURES_BEFORE_DEMOTION,
};
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheStats, ResponseCache, TtlCache},
    health::HealthTracker,
    http::ReqwestTransport,
    registry::{Provider, ProviderRegistry},
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const REALTIME_CACHE_TTL: Duration = Duration::from_secs(5);
const HISTORICAL_CACHE_TTL: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Tuning for one failover client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverConfig {
    /// How long a cached response stays valid
    pub cache_ttl: Duration,
    /// Upper bound for a single provider attempt
    pub request_timeout: Duration,
    /// Consecutive failures after which a provider is tried last
    pub max_failures_before_demotion: u32,
    /// Optional bound on cached entries
    pub max_cache_entries: Option<usize>,
}

impl FailoverConfig {
    /// Short TTL for frequently changing node state
    pub fn realtime() -> Self {
        Self {
            cache_ttl: REALTIME_CACHE_TTL,
            ..Self::default()
        }
    }

    /// Longer TTL for indexed history and aggregates
    pub fn historical() -> Self {
        Self {
            cache_ttl: HISTORICAL_CACHE_TTL,
            ..Self::default()
        }
    }

    /// Override the cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the per-attempt timeout
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Override the demotion threshold
    #[must_use]
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures_before_demotion = max_failures;
        self
    }

    /// Bound the cache
    #[must_use]
    pub fn with_max_cache_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_cache_entries = max_entries;
        self
    }

    fn build_cache(&self) -> TtlCache {
        match self.max_cache_entries {
            Some(max) => TtlCache::bounded(self.cache_ttl, max),
            None => TtlCache::new(self.cache_ttl),
        }
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: REALTIME_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_failures_before_demotion: DEFAULT_MAX_FAILURES_BEFORE_DEMOTION,
            max_cache_entries: None,
        }
    }
}

/// Multi-provider client with response caching and health-aware ordering
#[derive(Debug)]
pub struct FailoverClient<T = ReqwestTransport, C = TtlCache> {
    name: String,
    registry: ProviderRegistry,
    transport: T,
    cache: C,
    health: HealthTracker,
    config: FailoverConfig,
}

impl FailoverClient {
    /// Create a client using reqwest and a [`TtlCache`] built from `config`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        name: impl Into<String>,
        registry: ProviderRegistry,
        config: FailoverConfig,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        let cache = config.build_cache();
        Ok(Self::with_parts(name, registry, config, transport, cache))
    }
}

impl<T: HttpTransport> FailoverClient<T, TtlCache> {
    /// Create a client over a custom transport with the default cache
    pub fn with_transport(
        name: impl Into<String>,
        registry: ProviderRegistry,
        config: FailoverConfig,
        transport: T,
    ) -> Self {
        let cache = config.build_cache();
        Self::with_parts(name, registry, config, transport, cache)
    }
}

impl<T: HttpTransport, C: ResponseCache> FailoverClient<T, C> {
    /// Assemble a client from explicit parts
    pub fn with_parts(
        name: impl Into<String>,
        registry: ProviderRegistry,
        config: FailoverConfig,
        transport: T,
        cache: C,
    ) -> Self {
        let health = HealthTracker::new(&registry, config.max_failures_before_demotion);
        Self {
            name: name.into(),
            registry,
            transport,
            cache,
            health,
            config,
        }
    }

    /// Client name used in logs and health reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Providers behind this client
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Provider order the next call for `request` would use
    pub fn select_providers(&self, request: &FetchRequest) -> Vec<&Provider> {
        self.registry
            .select(request, |provider| self.health.is_demoted(&provider.name))
    }

    /// Execute a request with caching and failover
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AllProvidersFailed`] when every selected provider
    /// failed, or [`ApiError::NoEligibleProviders`] when none could be selected.
    pub async fn execute(&self, request: &FetchRequest) -> Result<ResponsePayload, ApiError> {
        let cache_key = request.cache_key();

        if request.cacheable && !request.bypass_cache {
            if let Some(cached) = self.cache.get(&cache_key) {
                debug!(client = %self.name, key = %cache_key, "cache hit");
                return Ok(cached);
            }
            debug!(client = %self.name, key = %cache_key, "cache miss");
        }

        let providers = self.select_providers(request);
        if providers.is_empty() {
            warn!(
                client = %self.name,
                path = %request.path,
                height = ?request.target_height,
                "no eligible provider for request"
            );
            return Err(ApiError::NoEligibleProviders {
                path: request.path.clone(),
            });
        }

        let mut last_error = None;
        for provider in providers {
            match self.attempt(provider, request).await {
                Ok(payload) => {
                    let recovered = self.health.consecutive_failures(&provider.name) > 0;
                    self.health.record_success(&provider.name);
                    if recovered {
                        info!(client = %self.name, provider = %provider.name, "provider recovered");
                    }
                    if request.cacheable {
                        self.cache.set(&cache_key, payload.clone());
                    }
                    debug!(
                        client = %self.name,
                        provider = %provider.name,
                        path = %request.path,
                        "request served"
                    );
                    return Ok(payload);
                }
                Err(error) => {
                    let consecutive_failures = self.health.record_failure(&provider.name, &error);
                    warn!(
                        client = %self.name,
                        provider = %provider.name,
                        path = %request.path,
                        consecutive_failures,
                        error = %error,
                        "provider attempt failed, trying next"
                    );
                    last_error = Some(error);
                }
            }
        }

        let last_error = last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
        Err(ApiError::AllProvidersFailed {
            path: request.path.clone(),
            last_error,
        })
    }

    /// Execute a request and decode the JSON payload
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::execute`], or [`ApiError::InvalidResponse`]
    /// if the payload does not decode into `R`.
    pub async fn fetch<R: DeserializeOwned>(&self, request: &FetchRequest) -> Result<R, ApiError> {
        self.execute(request).await?.decode()
    }

    async fn attempt(
        &self,
        provider: &Provider,
        request: &FetchRequest,
    ) -> Result<ResponsePayload, ApiError> {
        let transport_request = TransportRequest {
            method: request.method,
            url: provider.url_for(request),
            headers: provider.headers_for(request),
            body: request.body.clone(),
        };

        let response = timeout(
            self.config.request_timeout,
            self.transport.send(transport_request),
        )
        .await
        .map_err(|_| ApiError::Timeout {
            timeout_ms: u64::try_from(self.config.request_timeout.as_millis())
                .unwrap_or(u64::MAX),
        })??;

        if !response.is_success() {
            let message: String = response.body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        ResponsePayload::parse(&response.body, request.parse_as)
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!(client = %self.name, "response cache cleared");
    }

    /// Zero every provider's consecutive-failure counter
    pub fn reset_failure_counters(&self) {
        self.health.reset();
        info!(client = %self.name, "provider failure counters reset");
    }

    /// Current health of every provider in priority order
    pub fn health_snapshot(&self) -> Vec<ProviderHealthSnapshot> {
        self.health.snapshot()
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}
