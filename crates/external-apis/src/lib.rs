// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Multi-provider access to THORChain data
//!
//! Every upstream request goes through a [`FailoverClient`]: providers are
//! tried in registry order, failing ones are demoted behind healthy ones, and
//! successful responses are cached for a short TTL.
//!
//! # Architecture
//!
//! - **Providers**: [`registry`] - ordered endpoint list and selection rules
//! - **Failover**: [`failover`] - attempt loop, timeouts, health bookkeeping
//! - **Caching**: [`cache`] - TTL cache keyed by path and height
//! - **Typed clients**: [`thornode`], [`midgard`], [`coingecko`]

pub mod cache;
pub mod coingecko;
pub mod failover;
pub mod health;
pub mod http;
pub mod midgard;
pub mod options;
pub mod registry;
pub mod thornode;

#[cfg(test)]
mod testing;

pub use cache::{CacheStats, ResponseCache, TtlCache};
pub use coingecko::{Currency, ExchangeRates, SpotPriceClient, SpotPriceConfig, SpotPriceError};
pub use failover::{FailoverClient, FailoverConfig};
pub use health::HealthTracker;
pub use http::ReqwestTransport;
pub use midgard::{ActionsParams, HistoryInterval, HistoryParams, MidgardClient};
pub use options::RequestOptions;
pub use registry::{Provider, ProviderRegistry, RegistryError};
pub use thornode::ThornodeClient;
