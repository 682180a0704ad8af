// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! THORChain chain identifiers
//!
//! THORChain names external chains by short uppercase tickers (`BTC`, `GAIA`, ...)
//! in asset notation, inbound addresses and outbound fees. This module provides a
//! type-safe view of those identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Chains connected to THORChain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
pub enum Chain {
    /// THORChain itself
    Thor,
    /// Bitcoin
    Bitcoin,
    /// Ethereum mainnet
    Ethereum,
    /// Bitcoin Cash
    BitcoinCash,
    /// Litecoin
    Litecoin,
    /// Dogecoin
    Dogecoin,
    /// Avalanche C-Chain
    Avalanche,
    /// Cosmos Hub
    Gaia,
    /// BNB Smart Chain
    Bsc,
    /// Base
    Base,
    /// XRP Ledger
    Xrp,
    /// Tron
    Tron,
}

impl Chain {
    /// Returns the identifier THORChain uses for this chain
    pub const fn id(self) -> &'static str {
        match self {
            Self::Thor => "THOR",
            Self::Bitcoin => "BTC",
            Self::Ethereum => "ETH",
            Self::BitcoinCash => "BCH",
            Self::Litecoin => "LTC",
            Self::Dogecoin => "DOGE",
            Self::Avalanche => "AVAX",
            Self::Gaia => "GAIA",
            Self::Bsc => "BSC",
            Self::Base => "BASE",
            Self::Xrp => "XRP",
            Self::Tron => "TRON",
        }
    }

    /// Returns the symbol of the chain's native gas asset
    pub const fn native_token(self) -> &'static str {
        match self {
            Self::Thor => "RUNE",
            Self::Bitcoin => "BTC",
            Self::Ethereum | Self::Base => "ETH",
            Self::BitcoinCash => "BCH",
            Self::Litecoin => "LTC",
            Self::Dogecoin => "DOGE",
            Self::Avalanche => "AVAX",
            Self::Gaia => "ATOM",
            Self::Bsc => "BNB",
            Self::Xrp => "XRP",
            Self::Tron => "TRX",
        }
    }

    /// Whether inbound transfers on this chain go through a router contract
    pub const fn has_router(self) -> bool {
        matches!(
            self,
            Self::Ethereum | Self::Avalanche | Self::Bsc | Self::Base
        )
    }

    /// Returns all chains connected to THORChain
    pub const fn all() -> &'static [Self] {
        &[
            Self::Thor,
            Self::Bitcoin,
            Self::Ethereum,
            Self::BitcoinCash,
            Self::Litecoin,
            Self::Dogecoin,
            Self::Avalanche,
            Self::Gaia,
            Self::Bsc,
            Self::Base,
            Self::Xrp,
            Self::Tron,
        ]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Chain {
    type Err = ChainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|chain| chain.id() == upper)
            .ok_or_else(|| ChainParseError::Unknown(s.to_string()))
    }
}

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Error type for chain identifier parsing
#[derive(Debug, thiserror::Error)]
pub enum ChainParseError {
    /// Identifier is not a chain THORChain knows about
    #[error(
        "unsupported chain: {0}. Supported chains are: THOR, BTC, ETH, BCH, LTC, DOGE, AVAX, GAIA, BSC, BASE, XRP, TRON"
    )]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("btc".parse::<Chain>().ok(), Some(Chain::Bitcoin));
        assert_eq!(" Gaia ".parse::<Chain>().ok(), Some(Chain::Gaia));
        assert!("SOL".parse::<Chain>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for &chain in Chain::all() {
            assert_eq!(chain.to_string().parse::<Chain>().ok(), Some(chain));
        }
    }

    #[test]
    fn native_tokens() {
        assert_eq!(Chain::Gaia.native_token(), "ATOM");
        assert_eq!(Chain::Base.native_token(), "ETH");
        assert_eq!(Chain::Tron.native_token(), "TRX");
    }

    #[test]
    fn routers_only_on_evm_chains() {
        let routed: Vec<_> = Chain::all()
            .iter()
            .copied()
            .filter(|c| c.has_router())
            .collect();
        assert_eq!(
            routed,
            vec![Chain::Ethereum, Chain::Avalanche, Chain::Bsc, Chain::Base]
        );
    }

    #[test]
    fn serde_uses_thorchain_identifier() {
        let json = serde_json::to_string(&Chain::Dogecoin).unwrap();
        assert_eq!(json, "\"DOGE\"");
        let parsed: Chain = serde_json::from_str("\"bsc\"").unwrap();
        assert_eq!(parsed, Chain::Bsc);
    }
}
