// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pool list polling

use std::time::Duration;

use api_client::{ApiError, HttpTransport};
use external_apis::{ReqwestTransport, RequestOptions, ThornodeClient, thornode::Pool};
use serde::Serialize;

use crate::poller::PollSource;

/// Default tick interval
pub const POOLS_INTERVAL: Duration = Duration::from_secs(60);

/// Snapshot of every pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolSet {
    /// Pools in upstream order
    pub pools: Vec<Pool>,
}

impl PoolSet {
    /// Pool with the given asset identifier, case-insensitive
    pub fn by_asset(&self, asset: &str) -> Option<&Pool> {
        self.pools
            .iter()
            .find(|p| p.asset.eq_ignore_ascii_case(asset))
    }

    /// Pools open for swaps
    pub fn available(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter().filter(|p| p.is_available())
    }

    /// Number of pools open for swaps
    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    /// Number of pools in any state
    pub fn total_count(&self) -> usize {
        self.pools.len()
    }

    /// RUNE depth across available pools, in base units
    pub fn total_rune_depth(&self) -> u128 {
        self.available().map(|p| p.balance_rune).sum()
    }
}

/// Polls `/thorchain/pools`, preferring the secondary node
#[derive(Debug)]
pub struct PoolsSource<T = ReqwestTransport> {
    client: ThornodeClient<T>,
}

impl<T> PoolsSource<T> {
    /// Poll the pool list through `client`
    pub fn new(client: ThornodeClient<T>) -> Self {
        Self { client }
    }
}

impl<T: HttpTransport + 'static> PollSource for PoolsSource<T> {
    type Output = PoolSet;

    fn name(&self) -> &'static str {
        "pools"
    }

    fn interval(&self) -> Duration {
        POOLS_INTERVAL
    }

    async fn fetch(&self) -> Result<PoolSet, ApiError> {
        let pools = self
            .client
            .pools(RequestOptions::prefer_secondary())
            .await?;
        Ok(PoolSet { pools })
    }
}
