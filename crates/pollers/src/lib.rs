// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Background pollers for dashboard data
//!
//! - [`Poller`]: generic reference-counted timer publishing a [`PollState`]
//! - [`RunePriceSource`]: RUNE/USD price every 6 s with a one hour history
//! - [`PoolsSource`]: pool list every 60 s from the secondary node

pub mod poller;
pub mod pools;
pub mod rune_price;

pub use poller::{PollSource, PollState, PollSubscription, Poller};
pub use pools::{POOLS_INTERVAL, PoolSet, PoolsSource};
pub use rune_price::{
    PriceDirection, PricePoint, RUNE_PRICE_INTERVAL, RUNE_PRICE_WINDOW, RunePrice,
    RunePriceSource,
};
