// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! THORChain asset notation and base units
//!
//! Assets are written `CHAIN.SYMBOL` or `CHAIN.SYMBOL-CONTRACT`, e.g.
//! `ETH.USDC-0XA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48`. Amounts on THORChain are
//! integers with eight implied decimals.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use crate::chains::{Chain, ChainParseError};

/// Number of base units in one whole token
pub const THOR_BASE: f64 = 1e8;

/// Convert an amount in base units to a whole-token amount
#[allow(clippy::cast_precision_loss)]
pub fn from_base_unit(amount: u128) -> f64 {
    amount as f64 / THOR_BASE
}

/// Convert a whole-token amount to base units, rounding to the nearest unit
///
/// Negative and non-finite inputs map to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_base_unit(amount: f64) -> u128 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    (amount * THOR_BASE).round() as u128
}

/// A parsed THORChain asset identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, ToSchema)]
pub struct Asset {
    /// Chain the asset lives on
    #[schema(value_type = String)]
    pub chain: Chain,
    /// Ticker symbol
    pub symbol: String,
    /// Token contract, absent for gas assets
    pub contract: Option<String>,
}

impl Asset {
    /// The native RUNE asset
    pub fn rune() -> Self {
        Self {
            chain: Chain::Thor,
            symbol: "RUNE".to_string(),
            contract: None,
        }
    }

    /// Whether this is the chain's gas asset rather than a token
    pub fn is_native(&self) -> bool {
        self.contract.is_none()
    }

    /// Whether this is a synthetic asset minted on THORChain (e.g. `THOR.BTC`)
    pub fn is_synth(&self) -> bool {
        self.chain == Chain::Thor && self.symbol != "RUNE"
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.chain, self.symbol)?;
        if let Some(contract) = &self.contract {
            write!(f, "-{contract}")?;
        }
        Ok(())
    }
}

impl FromStr for Asset {
    type Err = AssetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain, rest) = s
            .split_once('.')
            .ok_or_else(|| AssetParseError::MissingSeparator(s.to_string()))?;
        let chain = chain.parse::<Chain>()?;

        let (symbol, contract) = match rest.split_once('-') {
            Some((symbol, contract)) if !contract.is_empty() => {
                (symbol, Some(contract.to_ascii_uppercase()))
            }
            Some((symbol, _)) => (symbol, None),
            None => (rest, None),
        };
        if symbol.is_empty() {
            return Err(AssetParseError::EmptySymbol(s.to_string()));
        }

        Ok(Self {
            chain,
            symbol: symbol.to_ascii_uppercase(),
            contract,
        })
    }
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Error type for asset parsing
#[derive(Debug, thiserror::Error)]
pub enum AssetParseError {
    /// No `.` between chain and symbol
    #[error("asset '{0}' is not in CHAIN.SYMBOL notation")]
    MissingSeparator(String),
    /// Nothing after the chain prefix
    #[error("asset '{0}' has an empty symbol")]
    EmptySymbol(String),
    /// Chain prefix not recognised
    #[error(transparent)]
    Chain(#[from] ChainParseError),
}
