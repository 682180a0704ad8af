// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the THORChain dashboard
//!
//! This crate provides the chain identifiers, asset notation and base-unit
//! helpers that are shared across the workspace, avoiding circular dependencies
//! between the fetch layer, the pollers and the HTTP surface.

pub mod assets;
pub mod chains;

pub use assets::{Asset, AssetParseError, THOR_BASE, from_base_unit, to_base_unit};
pub use chains::{Chain, ChainParseError};
