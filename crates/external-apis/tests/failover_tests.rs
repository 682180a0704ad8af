// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the typed clients over real HTTP
//!
//! Each provider is a wiremock server; the clients use the reqwest transport.

use std::time::Duration;

use api_client::{ApiError, HealthStatus};
use external_apis::{
    FailoverConfig, HistoryInterval, HistoryParams, MidgardClient, RequestOptions,
    SpotPriceClient, SpotPriceConfig, ThornodeClient,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

mod fixtures;
use fixtures::*;

async fn two_node_client() -> (MockServer, MockServer, ThornodeClient) {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    let client = ThornodeClient::with_providers(
        vec![
            provider("primary", &primary, 1),
            provider("secondary", &secondary, 2),
        ],
        test_config(),
    )
    .unwrap();
    (primary, secondary, client)
}

/// Primary answers 500, secondary serves the request
#[tokio::test]
async fn server_error_falls_over_to_secondary() {
    let (primary, secondary, client) = two_node_client().await;
    mount_status(&primary, "/thorchain/network", 500).await;
    mount_json(&secondary, "/thorchain/network", network_body(250_000_000)).await;

    let price = client.rune_price(RequestOptions::default()).await.unwrap();

    assert!((price - 2.5).abs() < 1e-9);
    let health = client.health_snapshot();
    assert_eq!(health[0].provider, "primary");
    assert_eq!(health[0].consecutive_failures, 1);
    assert!(health[0].last_error.as_deref().unwrap().contains("500"));
    assert_eq!(health[1].total_successes, 1);
}

/// A slow primary is abandoned after the request timeout
#[tokio::test]
async fn slow_primary_times_out() {
    let (primary, secondary, client) = two_node_client().await;
    Mock::given(method("GET"))
        .and(path("/thorchain/pools"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pools_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&primary)
        .await;
    mount_json(&secondary, "/thorchain/pools", pools_body()).await;

    let pools = client.pools(RequestOptions::default()).await.unwrap();

    assert_eq!(pools.len(), 2);
    assert!(pools[0].is_available());
    assert!(!pools[1].is_available());
    let health = client.health_snapshot();
    assert_eq!(
        health[0].last_error.as_deref(),
        Some("Request timeout after 300 ms")
    );
}

/// Cached responses are served without touching the network
#[tokio::test]
async fn repeated_requests_hit_cache() {
    let (primary, _secondary, client) = two_node_client().await;
    Mock::given(method("GET"))
        .and(path("/thorchain/network"))
        .respond_with(ResponseTemplate::new(200).set_body_json(network_body(100_000_000)))
        .expect(1)
        .mount(&primary)
        .await;

    for _ in 0..3 {
        assert_ok!(client.network(RequestOptions::default()).await);
    }

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.stores, 1);
}

/// Bypassing the cache still refreshes it
#[tokio::test]
async fn fresh_requests_skip_cache_read() {
    let (primary, _secondary, client) = two_node_client().await;
    Mock::given(method("GET"))
        .and(path("/thorchain/network"))
        .respond_with(ResponseTemplate::new(200).set_body_json(network_body(100_000_000)))
        .expect(2)
        .mount(&primary)
        .await;

    assert_ok!(client.network(RequestOptions::default()).await);
    assert_ok!(client.network(RequestOptions::fresh()).await);
    assert_ok!(client.network(RequestOptions::default()).await);
}

/// After repeated failures the primary is tried after the secondary
#[tokio::test]
async fn failing_primary_is_demoted() {
    let (primary, secondary, client) = two_node_client().await;
    Mock::given(method("GET"))
        .and(path("/thorchain/nodes"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&primary)
        .await;
    mount_json(&secondary, "/thorchain/nodes", json!([])).await;

    for _ in 0..4 {
        assert_ok!(client.nodes(RequestOptions::fresh()).await);
    }

    let health = client.health_snapshot();
    assert!(health[0].is_demoted());
    assert!(health[0].status().is_down());

    client.reset_failures();
    assert_eq!(client.health_snapshot()[0].status(), HealthStatus::Up);
}

/// Every provider failing yields an aggregate error naming the path
#[tokio::test]
async fn exhausted_providers_report_last_error() {
    let (primary, secondary, client) = two_node_client().await;
    mount_status(&primary, "/thorchain/lastblock", 502).await;
    mount_status(&secondary, "/thorchain/lastblock", 504).await;

    let error = assert_err!(client.current_block_height(RequestOptions::default()).await);

    match error {
        ApiError::AllProvidersFailed { path, last_error } => {
            assert_eq!(path, "/thorchain/lastblock");
            assert!(last_error.contains("504"), "{last_error}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(client.cache_stats().entry_count, 0);
}

/// Height-pinned queries go only to providers that accept a height
#[tokio::test]
async fn pinned_height_uses_archive() {
    let live = MockServer::start().await;
    let archive = MockServer::start().await;
    let client = ThornodeClient::with_providers(
        vec![
            provider("live", &live, 1),
            provider("archive", &archive, 2).historical_only(),
        ],
        test_config(),
    )
    .unwrap();
    Mock::given(method("GET"))
        .and(path("/thorchain/pool/BTC.BTC"))
        .and(query_param("height", "17000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&pools_body()[0]))
        .expect(1)
        .mount(&archive)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&live)
        .await;

    let pool = client
        .pool("BTC.BTC", RequestOptions::at_height(17_000_000))
        .await
        .unwrap();

    assert_eq!(pool.asset, "BTC.BTC");
    assert_eq!(pool.balance_asset, 50_000_000_000);
}

/// Provider headers are sent and mimir values are read as text
#[tokio::test]
async fn mimir_is_fetched_as_text_with_provider_headers() {
    let server = MockServer::start().await;
    let client = ThornodeClient::with_providers(
        vec![provider("ninerealms", &server, 1).with_header("X-Client-ID", "RuneTools")],
        test_config(),
    )
    .unwrap();
    Mock::given(method("GET"))
        .and(path("/thorchain/mimir/key/HALTTRADING"))
        .and(header("x-client-id", "RuneTools"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1\n"))
        .mount(&server)
        .await;

    let values = client
        .mimir_values(&["HALTTRADING", "MISSING"], RequestOptions::default())
        .await;

    assert_eq!(values["HALTTRADING"], 1);
    assert_eq!(values["MISSING"], 0);
}

/// Midgard history requests carry the interval query
#[tokio::test]
async fn midgard_history_query() {
    let server = MockServer::start().await;
    let client = MidgardClient::with_providers(
        vec![provider("midgard", &server, 1)],
        FailoverConfig::historical(),
    )
    .unwrap();
    Mock::given(method("GET"))
        .and(path("/history/earnings"))
        .and(query_param("interval", "day"))
        .and(query_param("count", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "intervals": [{ "startTime": "1", "endTime": "2" }],
            "meta": { "earnings": "100" }
        })))
        .mount(&server)
        .await;

    let history = client
        .earnings_history(
            &HistoryParams::last(HistoryInterval::Day, 7),
            RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(history.intervals.len(), 1);
    assert_eq!(history.meta["earnings"], "100");
}

/// CoinGecko rates are parsed from the simple price endpoint
#[tokio::test]
async fn spot_prices_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "thorchain"))
        .and(query_param("vs_currencies", "usd,eur,gbp,jpy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thorchain": { "usd": 2.0, "eur": 1.8, "gbp": 1.5, "jpy": 310.0 }
        })))
        .mount(&server)
        .await;
    let client = SpotPriceClient::new(SpotPriceConfig {
        base_url: server.uri(),
        timeout: TEST_TIMEOUT,
    })
    .unwrap();

    let rates = client.exchange_rates().await.unwrap();

    assert!((rates.usd - 2.0).abs() < f64::EPSILON);
    assert!((rates.jpy - 310.0).abs() < f64::EPSILON);
}

/// CoinGecko rate limiting surfaces as a 429 status
#[tokio::test]
async fn spot_price_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    let client = SpotPriceClient::new(SpotPriceConfig {
        base_url: server.uri(),
        timeout: TEST_TIMEOUT,
    })
    .unwrap();

    let error = ApiError::from(client.exchange_rates().await.unwrap_err());

    assert!(matches!(error, ApiError::Status { status: 429, .. }));
}
