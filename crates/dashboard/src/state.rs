// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! Shared application state for the dashboard: the upstream clients, the
//! pollers built on top of them, the metrics registry and the cancellation
//! token used for coordinated shutdown.

use std::{collections::BTreeMap, sync::Arc};

use api_client::ProviderHealthSnapshot;
use external_apis::{MidgardClient, SpotPriceClient, ThornodeClient};
use pollers::{PoolsSource, Poller, RunePriceSource};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::{
    config::{Environment, ServerConfig},
    error::ServerResult,
    metrics::Metrics,
};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    thornode: ThornodeClient,
    midgard: MidgardClient,
    /// `None` when spot prices are disabled
    spot_prices: Option<SpotPriceClient>,
    rune_price: Poller<RunePriceSource>,
    pools: Poller<PoolsSource>,
    metrics: Arc<Metrics>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Build clients and pollers from configuration
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if a provider list is invalid, or an
    /// upstream error if an HTTP client cannot be built.
    pub fn new(config: ServerConfig, cancellation_token: CancellationToken) -> ServerResult<Self> {
        let thornode =
            ThornodeClient::with_providers(config.thornode_providers()?, config.thornode_failover())?;
        let midgard =
            MidgardClient::with_providers(config.midgard_providers()?, config.midgard_failover())?;
        let spot_prices = if config.spot_prices.enabled {
            Some(SpotPriceClient::new(config.spot_prices.client_config())?)
        } else {
            None
        };
        Self::with_clients(config, thornode, midgard, spot_prices, cancellation_token)
    }

    /// Build state around existing clients
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Metrics` if the metrics registry cannot be built.
    pub fn with_clients(
        config: ServerConfig,
        thornode: ThornodeClient,
        midgard: MidgardClient,
        spot_prices: Option<SpotPriceClient>,
        cancellation_token: CancellationToken,
    ) -> ServerResult<Self> {
        let rune_price = Poller::with_interval(
            RunePriceSource::new(thornode.clone()).with_window(config.polling.rune_price_window()),
            config.polling.rune_price_interval(),
        );
        let pools = Poller::with_interval(
            PoolsSource::new(thornode.clone()),
            config.polling.pools_interval(),
        );

        Ok(Self {
            config,
            thornode,
            midgard,
            spot_prices,
            rune_price,
            pools,
            metrics: Arc::new(Metrics::new()?),
            cancellation_token,
        })
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// THORNode client
    pub fn thornode(&self) -> &ThornodeClient {
        &self.thornode
    }

    /// Midgard client
    pub fn midgard(&self) -> &MidgardClient {
        &self.midgard
    }

    /// Spot price client, if enabled
    pub fn spot_prices(&self) -> Option<&SpotPriceClient> {
        self.spot_prices.as_ref()
    }

    /// RUNE price poller
    pub fn rune_price(&self) -> &Poller<RunePriceSource> {
        &self.rune_price
    }

    /// Pool list poller
    pub fn pools(&self) -> &Poller<PoolsSource> {
        &self.pools
    }

    /// Metrics registry
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Copy client and poller counters into the metrics registry
    pub fn refresh_metrics(&self) {
        self.metrics
            .record_health("thornode", &self.thornode.health_snapshot());
        self.metrics
            .record_health("midgard", &self.midgard.health_snapshot());
        self.metrics
            .record_cache("thornode", &self.thornode.cache_stats());
        self.metrics
            .record_cache("midgard", &self.midgard.cache_stats());
        self.metrics
            .record_subscribers("rune_price", self.rune_price.subscriber_count());
        self.metrics
            .record_subscribers("pools", self.pools.subscriber_count());
    }

    /// Drop the cached responses of every upstream
    pub fn clear_caches(&self) {
        self.thornode.clear_cache();
        self.midgard.clear_cache();
    }

    /// Zero the provider failure counters of every upstream
    pub fn reset_failures(&self) {
        self.thornode.reset_failures();
        self.midgard.reset_failures();
    }

    /// Perform health check operations
    ///
    /// Reads tracked provider health only; no upstream request is made.
    pub fn health_check(&self) -> HealthCheck {
        let upstreams = BTreeMap::from([
            ("thornode".to_string(), self.thornode.health_snapshot()),
            ("midgard".to_string(), self.midgard.health_snapshot()),
        ]);
        let status = Self::overall_status(&upstreams);

        let pollers = BTreeMap::from([
            (
                "rune_price".to_string(),
                PollerHealth::new(
                    self.rune_price.subscriber_count(),
                    self.rune_price.state(),
                ),
            ),
            (
                "pools".to_string(),
                PollerHealth::new(self.pools.subscriber_count(), self.pools.state()),
            ),
        ]);

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            upstreams,
            pollers,
        }
    }

    /// Down if every provider of some upstream is demoted, degraded if any
    /// provider is failing
    fn overall_status(upstreams: &BTreeMap<String, Vec<ProviderHealthSnapshot>>) -> HealthStatus {
        let mut failing = Vec::new();
        for (name, providers) in upstreams {
            if !providers.is_empty() && providers.iter().all(ProviderHealthSnapshot::is_demoted) {
                return HealthStatus::Down {
                    reason: format!("every {name} provider is demoted").into_boxed_str(),
                };
            }
            failing.extend(
                providers
                    .iter()
                    .filter(|p| p.consecutive_failures > 0)
                    .map(|p| format!("{name}/{}", p.provider)),
            );
        }

        if failing.is_empty() {
            HealthStatus::Up
        } else {
            HealthStatus::Degraded {
                reason: format!("failing providers: {}", failing.join(", ")).into_boxed_str(),
            }
        }
    }
}

/// Health status of the dashboard
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Every provider answered its last request
    Up,

    /// Some upstream has no provider left in front of the list
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Some providers are failing but each upstream still has a healthy one
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Poller activity as seen by the health endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PollerHealth {
    /// Live subscribers
    pub subscribers: usize,
    /// Whether a value has been fetched
    pub has_value: bool,
    /// Message of the last failed fetch
    pub last_error: Option<String>,
    /// Time of the last successful fetch
    pub last_update: Option<String>,
    /// Successful fetches
    pub refresh_count: u64,
}

impl PollerHealth {
    fn new<T>(subscribers: usize, state: pollers::PollState<T>) -> Self {
        Self {
            subscribers,
            has_value: state.value.is_some(),
            last_error: state.error.map(|e| e.to_string()),
            last_update: state.last_update.map(|t| t.to_rfc3339()),
            refresh_count: state.refresh_count,
        }
    }
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Provider health per upstream
    #[schema(value_type = Object)]
    pub upstreams: BTreeMap<String, Vec<ProviderHealthSnapshot>>,
    /// Poller activity
    pub pollers: BTreeMap<String, PollerHealth>,
}
