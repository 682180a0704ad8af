// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! RUNE/USD price polling with a rolling history window

use std::time::Duration;

use api_client::{ApiError, HttpTransport};
use chrono::{DateTime, TimeDelta, Utc};
use external_apis::{ReqwestTransport, RequestOptions, ThornodeClient};
use serde::{Deserialize, Serialize};

use crate::poller::PollSource;

/// Default tick interval, matching the primary node's update cadence
pub const RUNE_PRICE_INTERVAL: Duration = Duration::from_secs(6);
/// Default history window
pub const RUNE_PRICE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Movement against the previous sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum PriceDirection {
    Up,
    Down,
    #[default]
    Neutral,
}

/// One price sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Sample time
    pub timestamp: DateTime<Utc>,
    /// Price in USD
    pub price: f64,
}

/// Latest price with its recent history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunePrice {
    /// Latest price in USD
    pub price_usd: f64,
    /// Price of the previous sample
    pub previous_usd: Option<f64>,
    /// Movement since the previous sample
    pub direction: PriceDirection,
    /// Samples within the window, oldest first
    pub history: Vec<PricePoint>,
}

impl RunePrice {
    /// Fold a new sample into `previous`, dropping samples older than `window`
    pub fn record(
        previous: Option<&Self>,
        price: f64,
        at: DateTime<Utc>,
        window: Duration,
    ) -> Self {
        let cutoff = TimeDelta::from_std(window)
            .ok()
            .and_then(|w| at.checked_sub_signed(w))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut history: Vec<PricePoint> = previous
            .map(|p| {
                p.history
                    .iter()
                    .filter(|point| point.timestamp >= cutoff)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        history.push(PricePoint {
            timestamp: at,
            price,
        });

        let previous_usd = previous.map(|p| p.price_usd);
        let direction = match previous_usd {
            Some(before) if price > before => PriceDirection::Up,
            Some(before) if price < before => PriceDirection::Down,
            _ => PriceDirection::Neutral,
        };

        Self {
            price_usd: price,
            previous_usd,
            direction,
            history,
        }
    }

    /// Percentage change from the oldest sample in the window
    pub fn window_change_percent(&self) -> Option<f64> {
        let first = self.history.first()?;
        if first.price <= 0.0 {
            return None;
        }
        Some((self.price_usd - first.price) / first.price * 100.0)
    }
}

/// Polls the network endpoint for the RUNE price
#[derive(Debug)]
pub struct RunePriceSource<T = ReqwestTransport> {
    client: ThornodeClient<T>,
    window: Duration,
}

impl<T> RunePriceSource<T> {
    /// Source with the default one hour window
    pub fn new(client: ThornodeClient<T>) -> Self {
        Self {
            client,
            window: RUNE_PRICE_WINDOW,
        }
    }

    /// Override the history window
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

impl<T: HttpTransport + 'static> PollSource for RunePriceSource<T> {
    type Output = RunePrice;

    fn name(&self) -> &'static str {
        "rune_price"
    }

    fn interval(&self) -> Duration {
        RUNE_PRICE_INTERVAL
    }

    async fn fetch(&self) -> Result<RunePrice, ApiError> {
        let price = self.client.rune_price(RequestOptions::default()).await?;
        Ok(RunePrice::record(None, price, Utc::now(), self.window))
    }

    fn merge(&self, previous: Option<&RunePrice>, fresh: RunePrice) -> RunePrice {
        let at = fresh.history.last().map_or_else(Utc::now, |p| p.timestamp);
        RunePrice::record(previous, fresh.price_usd, at, self.window)
    }
}
