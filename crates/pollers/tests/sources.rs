// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Domain pollers driven through a scripted transport

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use api_client::{ApiError, HttpTransport, TransportRequest, TransportResponse};
use external_apis::{FailoverClient, FailoverConfig, Provider, ProviderRegistry, ThornodeClient};
use pollers::{Poller, PoolsSource, PriceDirection, RUNE_PRICE_INTERVAL, RunePriceSource};
use serde_json::json;
use tokio::time::sleep;

const PRIMARY: &str = "https://primary.test";
const SECONDARY: &str = "https://secondary.test";

#[derive(Debug, Default)]
struct Scripted {
    bodies: Mutex<VecDeque<(u16, String)>>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl Scripted {
    fn new(bodies: impl IntoIterator<Item = (u16, serde_json::Value)>) -> Self {
        Self {
            bodies: Mutex::new(bodies.into_iter().map(|(s, b)| (s, b.to_string())).collect()),
            urls: Arc::default(),
        }
    }
}

impl HttpTransport for Scripted {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        self.urls.lock().unwrap().push(request.url);
        match self.bodies.lock().unwrap().pop_front() {
            Some((status, body)) => Ok(TransportResponse { status, body }),
            None => Err(ApiError::Http {
                message: "script exhausted".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn thornode(transport: Scripted) -> ThornodeClient<Scripted> {
    let registry = ProviderRegistry::new(vec![
        Provider::new("primary", PRIMARY, 1).unwrap(),
        Provider::new("secondary", SECONDARY, 2).unwrap(),
    ])
    .unwrap();
    ThornodeClient::from_failover(FailoverClient::with_transport(
        "thornode",
        registry,
        FailoverConfig::realtime(),
        transport,
    ))
}

fn network(price_in_tor: u64) -> serde_json::Value {
    json!({ "rune_price_in_tor": price_in_tor.to_string() })
}

#[tokio::test(start_paused = true)]
async fn rune_price_history_accumulates() {
    let transport = Scripted::new([(200, network(200_000_000)), (200, network(250_000_000))]);
    let poller = Poller::new(RunePriceSource::new(thornode(transport)));

    let _sub = poller.subscribe();
    sleep(Duration::from_millis(1)).await;
    let first = poller.state().value.unwrap();
    assert!((first.price_usd - 2.0).abs() < 1e-9);
    assert_eq!(first.direction, PriceDirection::Neutral);

    sleep(RUNE_PRICE_INTERVAL).await;
    let second = poller.state().value.unwrap();
    assert!((second.price_usd - 2.5).abs() < 1e-9);
    assert_eq!(second.direction, PriceDirection::Up);
    assert_eq!(second.history.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn rune_price_failure_keeps_last_price() {
    let transport = Scripted::new([
        (200, network(200_000_000)),
        (500, json!("down")),
        (500, json!("down")),
    ]);
    let poller = Poller::new(RunePriceSource::new(thornode(transport)));

    let _sub = poller.subscribe();
    sleep(Duration::from_millis(1)).await;
    sleep(RUNE_PRICE_INTERVAL).await;

    let state = poller.state();
    assert!((state.value.unwrap().price_usd - 2.0).abs() < 1e-9);
    assert!(matches!(
        state.error,
        Some(ApiError::AllProvidersFailed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn pools_prefer_secondary_provider() {
    let transport = Scripted::new([(
        200,
        json!([
            { "asset": "BTC.BTC", "status": "Available", "balance_rune": "1000" },
            { "asset": "ETH.ETH", "status": "Suspended", "balance_rune": "50" }
        ]),
    )]);
    let urls = Arc::clone(&transport.urls);
    let poller = Poller::new(PoolsSource::new(thornode(transport)));

    let pools = poller.force_refresh().await.unwrap();

    assert_eq!(pools.total_count(), 2);
    assert_eq!(pools.available_count(), 1);
    assert_eq!(pools.total_rune_depth(), 1000);
    assert_eq!(*urls.lock().unwrap(), [format!("{SECONDARY}/thorchain/pools")]);
}
