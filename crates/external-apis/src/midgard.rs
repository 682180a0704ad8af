// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Midgard REST client
//!
//! Indexed history and aggregates. Data changes slowly, so the client uses the
//! historical preset with its longer cache TTL.

use std::{fmt, sync::Arc, time::Duration};

use api_client::{ApiError, FetchRequest, HttpTransport, ProviderHealthSnapshot};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    cache::CacheStats,
    failover::{FailoverClient, FailoverConfig},
    http::ReqwestTransport,
    options::{RequestOptions, amount, count, segment, with_query},
    registry::{Provider, ProviderRegistry, RegistryError},
    thornode::CLIENT_ID,
};

/// Nine Realms Midgard endpoint
pub const NINEREALMS_MIDGARD_URL: &str = "https://midgard.ninerealms.com/v2";
/// Community Midgard endpoint used as fallback
pub const THORCHAIN_INFO_MIDGARD_URL: &str = "https://midgard.thorchain.info/v2";

/// Bucket size for history endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum HistoryInterval {
    #[serde(rename = "5min")]
    FiveMinutes,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl fmt::Display for HistoryInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FiveMinutes => "5min",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        })
    }
}

/// Query parameters for history endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryParams {
    /// Bucket size
    pub interval: Option<HistoryInterval>,
    /// Number of buckets
    pub count: Option<u32>,
    /// Start (unix seconds)
    pub from: Option<u64>,
    /// End (unix seconds)
    pub to: Option<u64>,
    /// Restrict to one pool, where the endpoint supports it
    pub pool: Option<String>,
}

impl HistoryParams {
    /// The last `count` buckets of `interval`
    pub fn last(interval: HistoryInterval, count: u32) -> Self {
        Self {
            interval: Some(interval),
            count: Some(count),
            ..Self::default()
        }
    }

    fn path(&self, base: &str) -> String {
        with_query(
            base,
            [
                ("pool", self.pool.clone()),
                ("interval", self.interval.map(|i| i.to_string())),
                ("count", self.count.map(|c| c.to_string())),
                ("from", self.from.map(|f| f.to_string())),
                ("to", self.to.map(|t| t.to_string())),
            ],
        )
    }
}

/// Query parameters for `/actions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsParams {
    /// Comma separated addresses
    pub address: Option<String>,
    /// Transaction id
    pub txid: Option<String>,
    /// Comma separated assets
    pub asset: Option<String>,
    /// Comma separated action types (`swap`, `addLiquidity`, ...)
    pub action_type: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

impl ActionsParams {
    fn path(&self) -> String {
        with_query(
            "/actions",
            [
                ("address", self.address.clone()),
                ("txid", self.txid.clone()),
                ("asset", self.asset.clone()),
                ("type", self.action_type.clone()),
                ("limit", self.limit.map(|l| l.to_string())),
                ("offset", self.offset.map(|o| o.to_string())),
            ],
        )
    }
}

/// Network summary from `/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MidgardStats {
    /// Total RUNE in pools
    #[serde(deserialize_with = "amount")]
    pub rune_depth: u128,
    /// RUNE price in USD as a decimal string
    #[serde(rename = "runePriceUSD")]
    pub rune_price_usd: String,
    /// All-time swap volume in RUNE
    #[serde(deserialize_with = "amount")]
    pub swap_volume: u128,
    /// Swaps in the last 24 hours
    #[serde(rename = "swapCount24h", deserialize_with = "count")]
    pub swap_count_24h: u64,
    /// Unique swappers
    #[serde(deserialize_with = "count")]
    pub unique_swapper_count: u64,
}

/// Pool summary from `/pools`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MidgardPool {
    /// Asset identifier
    pub asset: String,
    /// Pool status, lowercase
    pub status: String,
    /// Asset depth
    #[serde(deserialize_with = "amount")]
    pub asset_depth: u128,
    /// RUNE depth
    #[serde(deserialize_with = "amount")]
    pub rune_depth: u128,
    /// Asset price in USD as a decimal string
    #[serde(rename = "assetPriceUSD")]
    pub asset_price_usd: String,
    /// Annualised return as a decimal string
    pub annual_percentage_rate: String,
    /// Pool units
    #[serde(deserialize_with = "amount")]
    pub units: u128,
    /// 24h volume
    #[serde(rename = "volume24h", deserialize_with = "amount")]
    pub volume_24h: u128,
}

/// A churn from `/churns`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Churn {
    /// Timestamp in nanoseconds
    #[serde(deserialize_with = "count")]
    pub date: u64,
    /// THORChain height
    #[serde(deserialize_with = "count")]
    pub height: u64,
}

/// Indexer status from `/health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MidgardHealth {
    /// Database reachable
    pub database: bool,
    /// Caught up with the chain
    pub in_sync: bool,
    /// Last scanned height
    #[serde(deserialize_with = "count")]
    pub scanner_height: u64,
}

/// One pool position of a member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemberPool {
    /// Pool asset
    pub pool: String,
    /// RUNE side address
    pub rune_address: String,
    /// Asset side address
    pub asset_address: String,
    /// Owned liquidity units
    #[serde(deserialize_with = "amount")]
    pub liquidity_units: u128,
    /// RUNE added
    #[serde(deserialize_with = "amount")]
    pub rune_added: u128,
    /// Asset added
    #[serde(deserialize_with = "amount")]
    pub asset_added: u128,
    /// RUNE withdrawn
    #[serde(deserialize_with = "amount")]
    pub rune_withdrawn: u128,
    /// Asset withdrawn
    #[serde(deserialize_with = "amount")]
    pub asset_withdrawn: u128,
    /// First deposit (unix seconds)
    #[serde(deserialize_with = "count")]
    pub date_first_added: u64,
    /// Last deposit (unix seconds)
    #[serde(deserialize_with = "count")]
    pub date_last_added: u64,
}

/// Member positions from `/member/{address}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberDetails {
    /// Positions by pool
    pub pools: Vec<MemberPool>,
}

/// Bucketed history response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct History {
    /// Buckets, newest last
    pub intervals: Vec<serde_json::Value>,
    /// Aggregate over the whole range
    pub meta: serde_json::Value,
}

/// Typed client for Midgard endpoints
#[derive(Debug)]
pub struct MidgardClient<T = ReqwestTransport> {
    client: Arc<FailoverClient<T>>,
}

impl<T> Clone for MidgardClient<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl MidgardClient {
    /// Client against the public providers with the historical preset
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_providers(Self::default_providers()?, FailoverConfig::historical())
    }

    /// Client against custom providers
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the providers are invalid or the
    /// HTTP client cannot be built.
    pub fn with_providers(
        providers: Vec<Provider>,
        config: FailoverConfig,
    ) -> Result<Self, ApiError> {
        let registry = ProviderRegistry::new(providers)?;
        Ok(Self::from_failover(FailoverClient::new(
            "midgard", registry, config,
        )?))
    }

    /// The public Midgard providers in priority order
    ///
    /// # Errors
    ///
    /// Only fails if a built-in URL is malformed.
    pub fn default_providers() -> Result<Vec<Provider>, RegistryError> {
        Ok(vec![
            Provider::new("ninerealms", NINEREALMS_MIDGARD_URL, 1)?
                .with_header("x-client-id", CLIENT_ID)
                .with_update_interval(Duration::from_secs(30)),
            Provider::new("thorchain-info", THORCHAIN_INFO_MIDGARD_URL, 2)?
                .with_header("x-client-id", CLIENT_ID)
                .with_update_interval(Duration::from_secs(30)),
        ])
    }
}

impl<T: HttpTransport> MidgardClient<T> {
    /// Wrap an existing failover client
    pub fn from_failover(client: FailoverClient<T>) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Underlying failover client
    pub fn failover(&self) -> &FailoverClient<T> {
        &self.client
    }

    async fn get<R: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        self.client
            .fetch(&options.apply(FetchRequest::get(path)))
            .await
    }

    /// Network summary
    pub async fn stats(&self, options: RequestOptions) -> Result<MidgardStats, ApiError> {
        self.get("/stats", options).await
    }

    /// Statistics of one pool
    pub async fn pool_stats(
        &self,
        pool: &str,
        options: RequestOptions,
    ) -> Result<serde_json::Value, ApiError> {
        self.get(format!("/pool/{}/stats", segment(pool)), options)
            .await
    }

    /// All pools
    pub async fn pools(&self, options: RequestOptions) -> Result<Vec<MidgardPool>, ApiError> {
        self.get("/pools", options).await
    }

    /// Depth history of one pool
    pub async fn pool_history(
        &self,
        pool: &str,
        params: &HistoryParams,
        options: RequestOptions,
    ) -> Result<History, ApiError> {
        let params = HistoryParams {
            pool: None,
            ..params.clone()
        };
        self.get(
            params.path(&format!("/history/depths/{}", segment(pool))),
            options,
        )
        .await
    }

    /// Swap history
    pub async fn swap_history(
        &self,
        params: &HistoryParams,
        options: RequestOptions,
    ) -> Result<History, ApiError> {
        self.get(params.path("/history/swaps"), options).await
    }

    /// Earnings history
    pub async fn earnings_history(
        &self,
        params: &HistoryParams,
        options: RequestOptions,
    ) -> Result<History, ApiError> {
        self.get(params.path("/history/earnings"), options).await
    }

    /// RUNE price and depth history
    pub async fn rune_history(
        &self,
        params: &HistoryParams,
        options: RequestOptions,
    ) -> Result<History, ApiError> {
        self.get(params.path("/history/rune"), options).await
    }

    /// Liquidity change history
    pub async fn liquidity_history(
        &self,
        params: &HistoryParams,
        options: RequestOptions,
    ) -> Result<History, ApiError> {
        self.get(params.path("/history/liquidity_changes"), options)
            .await
    }

    /// Liquidity positions of an address
    pub async fn member(
        &self,
        address: &str,
        options: RequestOptions,
    ) -> Result<MemberDetails, ApiError> {
        self.get(format!("/member/{}", segment(address)), options)
            .await
    }

    /// Addresses providing liquidity to a pool
    pub async fn pool_members(
        &self,
        pool: &str,
        options: RequestOptions,
    ) -> Result<Vec<String>, ApiError> {
        self.get(with_query("/members", [("pool", Some(pool.to_string()))]), options)
            .await
    }

    /// Actions matching the filter
    pub async fn actions(
        &self,
        params: &ActionsParams,
        options: RequestOptions,
    ) -> Result<serde_json::Value, ApiError> {
        self.get(params.path(), options).await
    }

    /// Actions of one transaction
    pub async fn action(
        &self,
        txid: &str,
        options: RequestOptions,
    ) -> Result<serde_json::Value, ApiError> {
        let params = ActionsParams {
            txid: Some(txid.to_string()),
            ..ActionsParams::default()
        };
        self.actions(&params, options).await
    }

    /// Past churns, newest first
    pub async fn churns(&self, options: RequestOptions) -> Result<Vec<Churn>, ApiError> {
        self.get("/churns", options).await
    }

    /// Indexer health
    pub async fn health(&self, options: RequestOptions) -> Result<MidgardHealth, ApiError> {
        self.get("/health", options).await
    }

    /// TCY distribution of an address
    pub async fn tcy_distribution(
        &self,
        address: &str,
        options: RequestOptions,
    ) -> Result<serde_json::Value, ApiError> {
        self.get(format!("/tcy/distribution/{}", segment(address)), options)
            .await
    }

    /// Drop cached responses
    pub fn clear_cache(&self) {
        self.client.clear_cache();
    }

    /// Zero provider failure counters
    pub fn reset_failures(&self) {
        self.client.reset_failure_counters();
    }

    /// Provider health
    pub fn health_snapshot(&self) -> Vec<ProviderHealthSnapshot> {
        self.client.health_snapshot()
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.client.cache_stats()
    }
}
