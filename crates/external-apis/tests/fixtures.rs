// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Upstream fixtures shared by the integration tests

use std::time::Duration;

use external_apis::{FailoverConfig, Provider};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Request timeout short enough to keep delayed-response tests fast
pub const TEST_TIMEOUT: Duration = Duration::from_millis(300);

/// Failover config for tests against local mock servers
pub fn test_config() -> FailoverConfig {
    FailoverConfig::realtime().with_request_timeout(TEST_TIMEOUT)
}

/// Provider pointing at a mock server
pub fn provider(name: &str, server: &MockServer, priority: u32) -> Provider {
    Provider::new(name, &server.uri(), priority).unwrap()
}

/// `/thorchain/network` body with the given TOR price
pub fn network_body(rune_price_in_tor: u64) -> Value {
    json!({
        "bond_reward_rune": "123456789",
        "total_bond_units": "0",
        "total_reserve": "6500000000000000",
        "vaults_migrating": false,
        "rune_price_in_tor": rune_price_in_tor.to_string(),
        "tor_price_in_rune": "40000000",
        "native_tx_fee_rune": "2000000",
        "native_outbound_fee_rune": "2000000"
    })
}

/// `/thorchain/pools` body with one available and one staged pool
pub fn pools_body() -> Value {
    json!([
        {
            "asset": "BTC.BTC",
            "status": "Available",
            "decimals": 8,
            "balance_asset": "50000000000",
            "balance_rune": "1500000000000000",
            "asset_tor_price": "6000000000000",
            "pool_units": "900000000000000",
            "LP_units": "850000000000000",
            "synth_units": "50000000000000",
            "synth_supply": "1000000000",
            "pending_inbound_rune": "0",
            "pending_inbound_asset": "0",
            "trading_halted": false
        },
        {
            "asset": "ETH.USDC-0XA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48",
            "status": "Staged",
            "balance_asset": "1000",
            "balance_rune": "1000",
            "asset_tor_price": "100000000",
            "pool_units": "1000",
            "LP_units": "1000",
            "synth_units": "0",
            "synth_supply": "0",
            "pending_inbound_rune": "0",
            "pending_inbound_asset": "0",
            "trading_halted": false
        }
    ])
}

/// Mount a JSON response on `route`
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a failing status on `route`
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(server)
        .await;
}
