// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! THORNode REST client
//!
//! Node-state endpoints served by three interchangeable providers: a fast primary,
//! a stable secondary and an archive node that answers height-pinned queries.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use api_client::{ApiError, FetchRequest, HttpTransport, ProviderHealthSnapshot, ResponsePayload};
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Chain, from_base_unit};
use tracing::{debug, warn};

use crate::{
    cache::CacheStats,
    failover::{FailoverClient, FailoverConfig},
    http::ReqwestTransport,
    options::{RequestOptions, amount, segment, with_query},
    registry::{Provider, ProviderRegistry, RegistryError},
};

/// Liquify THORNode endpoint, refreshed every block
pub const LIQUIFY_THORNODE_URL: &str = "https://thornode.thorchain.liquify.com";
/// Nine Realms THORNode endpoint
pub const NINEREALMS_THORNODE_URL: &str = "https://thornode.ninerealms.com";
/// Nine Realms archive node, supports `?height=`
pub const NINEREALMS_ARCHIVE_URL: &str = "https://thornode-archive.ninerealms.com";
/// Client identifier sent to Nine Realms endpoints
pub const CLIENT_ID: &str = "RuneTools";

/// Network-wide parameters from `/thorchain/network`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInfo {
    /// Rewards accrued for bonders this churn, in base units
    #[serde(deserialize_with = "amount")]
    pub bond_reward_rune: u128,
    /// Total bond units
    #[serde(deserialize_with = "amount")]
    pub total_bond_units: u128,
    /// Protocol reserve, in base units
    #[serde(deserialize_with = "amount")]
    pub total_reserve: u128,
    /// Whether vaults are migrating during a churn
    pub vaults_migrating: bool,
    /// RUNE price in TOR (1e8 = 1 USD)
    #[serde(deserialize_with = "amount")]
    pub rune_price_in_tor: u128,
    /// TOR price in RUNE
    #[serde(deserialize_with = "amount")]
    pub tor_price_in_rune: u128,
    /// Fee for native transactions, in base units
    #[serde(deserialize_with = "amount")]
    pub native_tx_fee_rune: u128,
    /// Fee for native outbounds, in base units
    #[serde(deserialize_with = "amount")]
    pub native_outbound_fee_rune: u128,
}

impl NetworkInfo {
    /// RUNE price in USD
    pub fn rune_price_usd(&self) -> f64 {
        from_base_unit(self.rune_price_in_tor)
    }
}

/// Pool state from `/thorchain/pools`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pool {
    /// Asset identifier, e.g. `BTC.BTC`
    pub asset: String,
    /// `Available`, `Staged` or `Suspended`
    pub status: String,
    /// Decimals of the external asset
    pub decimals: Option<u8>,
    /// Asset depth, in base units
    #[serde(deserialize_with = "amount")]
    pub balance_asset: u128,
    /// RUNE depth, in base units
    #[serde(deserialize_with = "amount")]
    pub balance_rune: u128,
    /// Asset price in TOR
    #[serde(deserialize_with = "amount")]
    pub asset_tor_price: u128,
    /// Total pool units
    #[serde(deserialize_with = "amount")]
    pub pool_units: u128,
    /// Units owned by liquidity providers
    #[serde(rename = "LP_units", deserialize_with = "amount")]
    pub lp_units: u128,
    /// Units backing synths
    #[serde(deserialize_with = "amount")]
    pub synth_units: u128,
    /// Outstanding synth supply
    #[serde(deserialize_with = "amount")]
    pub synth_supply: u128,
    /// Inbound RUNE waiting for the asset side
    #[serde(deserialize_with = "amount")]
    pub pending_inbound_rune: u128,
    /// Inbound asset waiting for the RUNE side
    #[serde(deserialize_with = "amount")]
    pub pending_inbound_asset: u128,
    /// Whether trading on the pool is halted
    pub trading_halted: bool,
}

impl Pool {
    /// Whether the pool is open for swaps
    pub fn is_available(&self) -> bool {
        self.status.eq_ignore_ascii_case("available")
    }

    /// Parsed asset, if the identifier is well formed
    pub fn parsed_asset(&self) -> Option<Asset> {
        self.asset.parse().ok()
    }
}

/// Node operator record from `/thorchain/nodes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Node address
    pub node_address: String,
    /// `Active`, `Standby`, `Ready`, `Disabled` or `Whitelisted`
    pub status: String,
    /// Total bond, in base units
    #[serde(deserialize_with = "amount")]
    pub total_bond: u128,
    /// Rewards earned this churn, in base units
    #[serde(deserialize_with = "amount")]
    pub current_award: u128,
    /// Block the node became active
    pub active_block_height: u64,
    /// Slash points this churn
    pub slash_points: u64,
    /// Software version
    pub version: String,
    /// Public IP address
    pub ip_address: String,
    /// Operator asked to leave
    pub requested_to_leave: bool,
    /// Network forced the node to leave
    pub forced_to_leave: bool,
}

impl Node {
    /// Whether the node is in the active set
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Vault address and gas data for one chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundAddress {
    /// Chain identifier
    pub chain: String,
    /// Vault address
    pub address: String,
    /// Router contract on EVM chains
    pub router: Option<String>,
    /// Chain halted
    pub halted: bool,
    /// Trading paused network-wide
    pub global_trading_paused: bool,
    /// Trading paused on this chain
    pub chain_trading_paused: bool,
    /// Liquidity actions paused on this chain
    pub chain_lp_actions_paused: bool,
    /// Gas rate
    pub gas_rate: String,
    /// Gas rate units
    pub gas_rate_units: String,
    /// Outbound fee in the chain's gas asset
    pub outbound_fee: String,
    /// Dust threshold
    pub dust_threshold: String,
}

/// Outbound fee for one asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundFee {
    /// Asset identifier
    pub asset: String,
    /// Fee in the asset, in base units
    #[serde(deserialize_with = "amount")]
    pub outbound_fee: u128,
    /// RUNE withheld from users for this asset
    #[serde(deserialize_with = "amount")]
    pub fee_withheld_rune: u128,
    /// RUNE spent on gas for this asset
    #[serde(deserialize_with = "amount")]
    pub fee_spent_rune: u128,
}

/// Last observed heights for one chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastBlock {
    /// Chain identifier
    pub chain: String,
    /// Last external height observed by THORChain
    pub last_observed_in: u64,
    /// Last external height signed out
    pub last_signed_out: u64,
    /// THORChain height
    pub thorchain: u64,
}

/// Liquidity position from `/thorchain/pool/{pool}/liquidity_provider/{address}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityProvider {
    /// Pool asset
    pub asset: String,
    /// RUNE side address
    pub rune_address: Option<String>,
    /// Asset side address
    pub asset_address: Option<String>,
    /// Owned pool units
    #[serde(deserialize_with = "amount")]
    pub units: u128,
    /// Pending RUNE
    #[serde(deserialize_with = "amount")]
    pub pending_rune: u128,
    /// Pending asset
    #[serde(deserialize_with = "amount")]
    pub pending_asset: u128,
    /// RUNE deposited
    #[serde(deserialize_with = "amount")]
    pub rune_deposit_value: u128,
    /// Asset deposited
    #[serde(deserialize_with = "amount")]
    pub asset_deposit_value: u128,
    /// RUNE redeemable now
    #[serde(deserialize_with = "amount")]
    pub rune_redeem_value: u128,
    /// Asset redeemable now
    #[serde(deserialize_with = "amount")]
    pub asset_redeem_value: u128,
}

/// One coin in a vault or balance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coin {
    /// Asset identifier or bank denom
    #[serde(alias = "denom")]
    pub asset: String,
    /// Amount in base units
    #[serde(deserialize_with = "amount")]
    pub amount: u128,
}

/// Bank balances from `/cosmos/bank/v1beta1/balances/{address}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balances {
    /// Coins held
    pub balances: Vec<Coin>,
}

impl Balances {
    /// RUNE balance in base units
    pub fn rune(&self) -> u128 {
        self.balances
            .iter()
            .find(|c| c.asset.eq_ignore_ascii_case("rune"))
            .map_or(0, |c| c.amount)
    }
}

/// Asgard vault from `/thorchain/vaults/asgard`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vault {
    /// Block the vault was created
    pub block_height: u64,
    /// Vault public key
    pub pub_key: String,
    /// `ActiveVault`, `RetiringVault`, ...
    pub status: String,
    /// Coins held
    pub coins: Vec<Coin>,
    /// Member node public keys
    pub membership: Vec<String>,
}

/// Parameters for `/thorchain/quote/swap`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapQuoteParams {
    /// Asset sold
    pub from_asset: String,
    /// Asset bought
    pub to_asset: String,
    /// Amount sold, in base units
    pub amount: u128,
    /// Destination address
    pub destination: Option<String>,
    /// Blocks between streaming sub-swaps
    pub streaming_interval: Option<u32>,
    /// Number of streaming sub-swaps
    pub streaming_quantity: Option<u32>,
    /// Price tolerance in basis points
    pub tolerance_bps: Option<u32>,
}

impl SwapQuoteParams {
    fn path(&self) -> String {
        with_query(
            "/thorchain/quote/swap",
            [
                ("from_asset", Some(self.from_asset.clone())),
                ("to_asset", Some(self.to_asset.clone())),
                ("amount", Some(self.amount.to_string())),
                ("destination", self.destination.clone()),
                (
                    "streaming_interval",
                    self.streaming_interval.map(|v| v.to_string()),
                ),
                (
                    "streaming_quantity",
                    self.streaming_quantity.map(|v| v.to_string()),
                ),
                ("tolerance_bps", self.tolerance_bps.map(|v| v.to_string())),
            ],
        )
    }
}

/// Fees quoted for a swap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteFees {
    /// Asset the fees are denominated in
    pub asset: String,
    /// Liquidity fee
    #[serde(deserialize_with = "amount")]
    pub liquidity: u128,
    /// Outbound fee
    #[serde(deserialize_with = "amount")]
    pub outbound: u128,
    /// Total fee
    #[serde(deserialize_with = "amount")]
    pub total: u128,
}

/// Swap quote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapQuote {
    /// Vault address to send the inbound to
    pub inbound_address: Option<String>,
    /// Expected output, in base units
    #[serde(deserialize_with = "amount")]
    pub expected_amount_out: u128,
    /// Quote expiry (unix seconds)
    pub expiry: u64,
    /// Fee breakdown
    pub fees: QuoteFees,
    /// Transaction memo
    pub memo: Option<String>,
    /// Upstream warning text
    pub warning: String,
    /// Estimated total swap time
    pub total_swap_seconds: u64,
}

/// Typed client for THORNode endpoints
///
/// Cloning is cheap; clones share the cache and provider health.
#[derive(Debug)]
pub struct ThornodeClient<T = ReqwestTransport> {
    client: Arc<FailoverClient<T>>,
}

impl<T> Clone for ThornodeClient<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl ThornodeClient {
    /// Client against the public providers with the real-time preset
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_providers(Self::default_providers()?, FailoverConfig::realtime())
    }

    /// Client against custom providers
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the providers are invalid or the
    /// HTTP client cannot be built.
    pub fn with_providers(providers: Vec<Provider>, config: FailoverConfig) -> Result<Self, ApiError> {
        let registry = ProviderRegistry::new(providers)?;
        Ok(Self::from_failover(FailoverClient::new("thornode", registry, config)?))
    }

    /// The public THORNode providers in priority order
    ///
    /// # Errors
    ///
    /// Only fails if a built-in URL is malformed.
    pub fn default_providers() -> Result<Vec<Provider>, RegistryError> {
        Ok(vec![
            Provider::new("liquify", LIQUIFY_THORNODE_URL, 1)?
                .with_update_interval(Duration::from_secs(6)),
            Provider::new("ninerealms", NINEREALMS_THORNODE_URL, 2)?
                .with_header("x-client-id", CLIENT_ID)
                .with_update_interval(Duration::from_secs(60)),
            Provider::new("archive", NINEREALMS_ARCHIVE_URL, 3)?
                .with_header("x-client-id", CLIENT_ID)
                .with_update_interval(Duration::from_secs(60))
                .historical_only(),
        ])
    }
}

impl<T: HttpTransport> ThornodeClient<T> {
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

    /// Execute an arbitrary request
    ///
    /// # Errors
    ///
    /// Returns the errors of [`FailoverClient::execute`].
    pub async fn execute(&self, request: &FetchRequest) -> Result<ResponsePayload, ApiError> {
        self.client.execute(request).await
    }

    async fn get<R: serde::de::DeserializeOwned>(
        &self,
        path: impl Into<String>,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        self.client
            .fetch(&options.apply(FetchRequest::get(path)))
            .await
    }

    /// Network parameters
    pub async fn network(&self, options: RequestOptions) -> Result<NetworkInfo, ApiError> {
        self.get("/thorchain/network", options).await
    }

    /// RUNE price in USD from the network's TOR price
    pub async fn rune_price(&self, options: RequestOptions) -> Result<f64, ApiError> {
        Ok(self.network(options).await?.rune_price_usd())
    }

    /// All pools
    pub async fn pools(&self, options: RequestOptions) -> Result<Vec<Pool>, ApiError> {
        self.get("/thorchain/pools", options).await
    }

    /// One pool
    pub async fn pool(&self, asset: &str, options: RequestOptions) -> Result<Pool, ApiError> {
        self.get(format!("/thorchain/pool/{}", segment(asset)), options)
            .await
    }

    /// All node operators
    pub async fn nodes(&self, options: RequestOptions) -> Result<Vec<Node>, ApiError> {
        self.get("/thorchain/nodes", options).await
    }

    /// Raw text value of one mimir key
    pub async fn mimir(&self, key: &str, options: RequestOptions) -> Result<String, ApiError> {
        let request = options.apply(
            FetchRequest::get(format!("/thorchain/mimir/key/{}", segment(key))).as_text(),
        );
        let payload = self.client.execute(&request).await?;
        Ok(match payload {
            ResponsePayload::Text(text) => text.trim().to_string(),
            ResponsePayload::Json(value) => value.to_string(),
        })
    }

    /// Numeric values of several mimir keys
    ///
    /// A key that cannot be fetched or parsed reads as 0.
    pub async fn mimir_values(&self, keys: &[&str], options: RequestOptions) -> BTreeMap<String, i64> {
        let mut values = BTreeMap::new();
        for &key in keys {
            let value = match self.mimir(key, options).await {
                Ok(text) => text.parse().unwrap_or_else(|_| {
                    debug!(key, value = %text, "mimir value is not an integer");
                    0
                }),
                Err(error) => {
                    warn!(key, error = %error, "failed to fetch mimir value");
                    0
                }
            };
            values.insert(key.to_string(), value);
        }
        values
    }

    /// Every mimir override
    pub async fn all_mimir(&self, options: RequestOptions) -> Result<BTreeMap<String, i64>, ApiError> {
        self.get("/thorchain/mimir", options).await
    }

    /// Bank balances of an address
    pub async fn balance(&self, address: &str, options: RequestOptions) -> Result<Balances, ApiError> {
        self.get(
            format!("/cosmos/bank/v1beta1/balances/{}", segment(address)),
            options,
        )
        .await
    }

    /// Liquidity position of an address in a pool
    pub async fn liquidity_provider(
        &self,
        pool: &str,
        address: &str,
        options: RequestOptions,
    ) -> Result<LiquidityProvider, ApiError> {
        self.get(
            format!(
                "/thorchain/pool/{}/liquidity_provider/{}",
                segment(pool),
                segment(address)
            ),
            options,
        )
        .await
    }

    /// Asgard vaults
    pub async fn vaults(&self, options: RequestOptions) -> Result<Vec<Vault>, ApiError> {
        self.get("/thorchain/vaults/asgard", options).await
    }

    /// Inbound addresses of every chain
    pub async fn inbound_addresses(&self, options: RequestOptions) -> Result<Vec<InboundAddress>, ApiError> {
        self.get("/thorchain/inbound_addresses", options).await
    }

    /// Inbound address of one chain
    pub async fn inbound_address(
        &self,
        chain: Chain,
        options: RequestOptions,
    ) -> Result<Option<InboundAddress>, ApiError> {
        Ok(self
            .inbound_addresses(options)
            .await?
            .into_iter()
            .find(|a| a.chain.eq_ignore_ascii_case(chain.id())))
    }

    /// Outbound fees of every asset
    pub async fn outbound_fees(&self, options: RequestOptions) -> Result<Vec<OutboundFee>, ApiError> {
        self.get("/thorchain/outbound_fees", options).await
    }

    /// Outbound fee of one asset
    pub async fn outbound_fee(
        &self,
        asset: &str,
        options: RequestOptions,
    ) -> Result<Option<OutboundFee>, ApiError> {
        Ok(self
            .outbound_fees(options)
            .await?
            .into_iter()
            .find(|f| f.asset.eq_ignore_ascii_case(asset)))
    }

    /// Protocol constants
    pub async fn constants(&self, options: RequestOptions) -> Result<serde_json::Value, ApiError> {
        self.get("/thorchain/constants", options).await
    }

    /// Tendermint node status
    pub async fn status(&self, options: RequestOptions) -> Result<serde_json::Value, ApiError> {
        self.get("/status", options).await
    }

    /// Last observed heights per chain
    pub async fn last_block(&self, options: RequestOptions) -> Result<Vec<LastBlock>, ApiError> {
        self.get("/thorchain/lastblock", options).await
    }

    /// Current THORChain block height
    pub async fn current_block_height(&self, options: RequestOptions) -> Result<u64, ApiError> {
        self.last_block(options)
            .await?
            .first()
            .map(|b| b.thorchain)
            .ok_or_else(|| ApiError::InvalidResponse {
                message: "lastblock response is empty".to_string(),
            })
    }

    /// Swap quote
    pub async fn swap_quote(
        &self,
        params: &SwapQuoteParams,
        options: RequestOptions,
    ) -> Result<SwapQuote, ApiError> {
        self.get(params.path(), options).await
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{MockTransport, Reply};

    fn client(transport: MockTransport) -> ThornodeClient<MockTransport> {
        let registry = ProviderRegistry::new(ThornodeClient::default_providers().unwrap()).unwrap();
        ThornodeClient::from_failover(FailoverClient::with_transport(
            "thornode",
            registry,
            FailoverConfig::realtime(),
            transport,
        ))
    }

    #[test]
    fn default_providers_match_public_endpoints() {
        let providers = ThornodeClient::default_providers().unwrap();
        let names: Vec<_> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["liquify", "ninerealms", "archive"]);
        assert!(providers[0].extra_headers.is_empty());
        assert_eq!(
            providers[1].extra_headers.get("x-client-id").map(String::as_str),
            Some(CLIENT_ID)
        );
        assert!(providers[2].historical_only);
        assert!(providers[2].supports_height_query);
    }

    #[tokio::test(start_paused = true)]
    async fn rune_price_converts_tor() {
        let transport = MockTransport::default();
        transport.route(
            LIQUIFY_THORNODE_URL,
            Reply::json(&json!({ "rune_price_in_tor": "152000000", "vaults_migrating": false })),
        );
        let client = client(transport);

        let price = client.rune_price(RequestOptions::default()).await.unwrap();
        assert!((price - 1.52).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn pool_at_height_goes_to_archive() {
        let transport = MockTransport::default();
        transport.route(
            NINEREALMS_ARCHIVE_URL,
            Reply::json(&json!({ "asset": "BTC.BTC", "status": "Available", "balance_rune": "10" })),
        );
        let client = client(transport);

        let pool = client
            .pool("BTC.BTC", RequestOptions::at_height(17_000_000))
            .await
            .unwrap();

        assert!(pool.is_available());
        assert_eq!(pool.balance_rune, 10);
        assert_eq!(
            client.failover().transport().urls(),
            [format!(
                "{NINEREALMS_ARCHIVE_URL}/thorchain/pool/BTC.BTC?height=17000000"
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mimir_values_default_to_zero() {
        let transport = MockTransport::default();
        transport.route(
            &format!("{LIQUIFY_THORNODE_URL}/thorchain/mimir/key/MINIMUMBONDINRUNE"),
            Reply::Status(200, "30000000000000\n".to_string()),
        );
        transport.route(
            &format!("{LIQUIFY_THORNODE_URL}/thorchain/mimir/key/BROKEN"),
            Reply::Status(200, "not-a-number".to_string()),
        );
        let client = client(transport);

        let values = client
            .mimir_values(&["MINIMUMBONDINRUNE", "BROKEN", "MISSING"], RequestOptions::default())
            .await;

        assert_eq!(values["MINIMUMBONDINRUNE"], 30_000_000_000_000);
        assert_eq!(values["BROKEN"], 0);
        assert_eq!(values["MISSING"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn inbound_address_lookup_by_chain() {
        let transport = MockTransport::default();
        transport.route(
            LIQUIFY_THORNODE_URL,
            Reply::json(&json!([
                { "chain": "BTC", "address": "bc1qvault", "halted": false },
                { "chain": "ETH", "address": "0xvault", "router": "0xrouter", "halted": true }
            ])),
        );
        let client = client(transport);

        let eth = client
            .inbound_address(Chain::Ethereum, RequestOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(eth.router.as_deref(), Some("0xrouter"));
        assert!(eth.halted);

        let doge = client
            .inbound_address(Chain::Dogecoin, RequestOptions::default())
            .await
            .unwrap();
        assert!(doge.is_none());
        assert_eq!(client.failover().transport().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn current_block_height_reads_first_entry() {
        let transport = MockTransport::default();
        transport.route(
            LIQUIFY_THORNODE_URL,
            Reply::json(&json!([{ "chain": "BTC", "last_observed_in": 870000, "thorchain": 19500000 }])),
        );
        let client = client(transport);

        let height = client
            .current_block_height(RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(height, 19_500_000);
    }

    #[tokio::test(start_paused = true)]
    async fn swap_quote_builds_query() {
        let transport = MockTransport::default();
        transport.route(
            LIQUIFY_THORNODE_URL,
            Reply::json(&json!({ "expected_amount_out": "99000", "fees": { "asset": "ETH.ETH", "total": "1000" } })),
        );
        let client = client(transport);
        let params = SwapQuoteParams {
            from_asset: "BTC.BTC".to_string(),
            to_asset: "ETH.ETH".to_string(),
            amount: 100_000,
            streaming_interval: Some(1),
            ..SwapQuoteParams::default()
        };

        let quote = client
            .swap_quote(&params, RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(quote.expected_amount_out, 99_000);
        assert_eq!(quote.fees.total, 1_000);
        assert_eq!(
            client.failover().transport().urls(),
            [format!(
                "{LIQUIFY_THORNODE_URL}/thorchain/quote/swap?from_asset=BTC.BTC&to_asset=ETH.ETH&amount=100000&streaming_interval=1"
            )]
        );
    }

    #[test]
    fn balances_find_rune() {
        let balances: Balances = serde_json::from_value(json!({
            "balances": [{ "denom": "tcy", "amount": "5" }, { "denom": "rune", "amount": "700000000" }]
        }))
        .unwrap();
        assert_eq!(balances.rune(), 700_000_000);
    }
}
