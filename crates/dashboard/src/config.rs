// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Dashboard configuration
//!
//! Loaded in layers, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config.json`
//! 3. `config.{environment}.json`
//! 4. `DASHBOARD_*` environment variables, nested keys separated by `__`
//!    (e.g. `DASHBOARD_THORNODE__CACHE_TTL_MS=2000`)

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::{
    FailoverConfig, MidgardClient, Provider, SpotPriceConfig, ThornodeClient, coingecko,
};
use pollers::{POOLS_INTERVAL, RUNE_PRICE_INTERVAL, RUNE_PRICE_WINDOW};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{ServerError, ServerResult};

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 outside the testing environment.
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Default development port
    pub const fn default_development() -> Self {
        Self {
            port: 8080,
            environment: Environment::Development,
        }
    }

    /// Port 0, letting the OS choose
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Port number
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Checked against the environment once the whole config is loaded.
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A timeout between 1 and 300 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if `seconds` is 0 or above 300.
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Default request timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Default upstream attempt timeout (10 seconds)
    pub const fn upstream_default() -> Self {
        Self(Duration::from_secs(10))
    }

    /// Timeout used by tests (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Timeout duration
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Failover overrides for one upstream API
///
/// Unset fields keep the client's preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Providers in any order; empty means the built-in public endpoints
    pub providers: Vec<Provider>,
    /// Cache TTL in milliseconds
    pub cache_ttl_ms: Option<u64>,
    /// Per-attempt timeout
    pub request_timeout_seconds: Option<TimeoutSeconds>,
    /// Consecutive failures before a provider is tried last
    pub max_failures_before_demotion: Option<u32>,
    /// Bound on cached entries
    pub max_cache_entries: Option<usize>,
}

impl UpstreamConfig {
    /// Apply the overrides to `preset`
    pub fn failover_config(&self, preset: FailoverConfig) -> FailoverConfig {
        let mut config = preset;
        if let Some(ttl) = self.cache_ttl_ms {
            config = config.with_cache_ttl(Duration::from_millis(ttl));
        }
        if let Some(timeout) = self.request_timeout_seconds {
            config = config.with_request_timeout(timeout.value());
        }
        if let Some(max) = self.max_failures_before_demotion {
            config = config.with_max_failures(max);
        }
        if self.max_cache_entries.is_some() {
            config = config.with_max_cache_entries(self.max_cache_entries);
        }
        config
    }

    /// Configured providers, or `defaults` when none are configured
    pub fn providers_or(&self, defaults: Vec<Provider>) -> Vec<Provider> {
        if self.providers.is_empty() {
            defaults
        } else {
            self.providers.clone()
        }
    }
}

/// Spot price settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotPriceSettings {
    /// Whether `/v1/exchange-rates` is served
    pub enabled: bool,
    /// CoinGecko base URL
    pub base_url: String,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

impl Default for SpotPriceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: coingecko::COINGECKO_URL.to_string(),
            timeout_seconds: TimeoutSeconds::upstream_default(),
        }
    }
}

impl SpotPriceSettings {
    /// Client settings
    pub fn client_config(&self) -> SpotPriceConfig {
        SpotPriceConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout_seconds.value(),
        }
    }
}

/// Background polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Keep the pollers subscribed while the server runs
    pub enabled: bool,
    /// RUNE price interval in seconds
    pub rune_price_interval_secs: u64,
    /// RUNE price history window in seconds
    pub rune_price_window_secs: u64,
    /// Pools interval in seconds
    pub pools_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rune_price_interval_secs: RUNE_PRICE_INTERVAL.as_secs(),
            rune_price_window_secs: RUNE_PRICE_WINDOW.as_secs(),
            pools_interval_secs: POOLS_INTERVAL.as_secs(),
        }
    }
}

impl PollingConfig {
    /// RUNE price interval
    pub fn rune_price_interval(&self) -> Duration {
        Duration::from_secs(self.rune_price_interval_secs.max(1))
    }

    /// RUNE price history window
    pub fn rune_price_window(&self) -> Duration {
        Duration::from_secs(self.rune_price_window_secs)
    }

    /// Pools interval
    pub fn pools_interval(&self) -> Duration {
        Duration::from_secs(self.pools_interval_secs.max(1))
    }
}

/// Dashboard server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: IpAddr,
    /// Bind port
    pub port: ServerPort,
    /// Whole-request timeout
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// THORNode failover overrides
    #[serde(default)]
    pub thornode: UpstreamConfig,
    /// Midgard failover overrides
    #[serde(default)]
    pub midgard: UpstreamConfig,
    /// CoinGecko settings
    #[serde(default)]
    pub spot_prices: SpotPriceSettings,
    /// Poller settings
    #[serde(default)]
    pub polling: PollingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            thornode: UpstreamConfig::default(),
            midgard: UpstreamConfig::default(),
            spot_prices: SpotPriceSettings::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from files and the environment
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using hierarchical sources
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("DASHBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let mut server_config: Self = config_builder.build()?.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(server_config)
    }

    /// Configuration for tests: OS-assigned port, no background polling
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            polling: PollingConfig {
                enabled: false,
                ..PollingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }

    /// THORNode providers to use
    ///
    /// # Errors
    ///
    /// Only fails if a built-in provider URL is malformed.
    pub fn thornode_providers(&self) -> ServerResult<Vec<Provider>> {
        let defaults = ThornodeClient::default_providers().map_err(|e| ServerError::Config {
            message: e.to_string(),
        })?;
        Ok(self.thornode.providers_or(defaults))
    }

    /// THORNode client settings on top of the real-time preset
    pub fn thornode_failover(&self) -> FailoverConfig {
        self.thornode.failover_config(FailoverConfig::realtime())
    }

    /// Midgard providers to use
    ///
    /// # Errors
    ///
    /// Only fails if a built-in provider URL is malformed.
    pub fn midgard_providers(&self) -> ServerResult<Vec<Provider>> {
        let defaults = MidgardClient::default_providers().map_err(|e| ServerError::Config {
            message: e.to_string(),
        })?;
        Ok(self.midgard.providers_or(defaults))
    }

    /// Midgard client settings on top of the historical preset
    pub fn midgard_failover(&self) -> FailoverConfig {
        self.midgard.failover_config(FailoverConfig::historical())
    }
}
