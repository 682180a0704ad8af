// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! CoinGecko spot price integration
//!
//! Fiat exchange rates for RUNE, used to display values in currencies other
//! than USD. Single provider, no failover.

use std::{fmt, str::FromStr, time::Duration};

use api_client::ApiError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Public CoinGecko API
pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for [`SpotPriceClient`]
#[derive(Debug, Clone)]
pub struct SpotPriceConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SpotPriceConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Display currencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    /// All currencies in display order
    pub const ALL: [Self; 4] = [Self::Usd, Self::Eur, Self::Gbp, Self::Jpy];

    /// Display symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Jpy => "¥",
        }
    }

    /// ISO code
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
        }
    }

    /// The following currency, wrapping around
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Usd => Self::Eur,
            Self::Eur => Self::Gbp,
            Self::Gbp => Self::Jpy,
            Self::Jpy => Self::Usd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = SpotPriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpotPriceError::UnknownCurrency(s.to_string()))
    }
}

/// RUNE price in each display currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    #[allow(missing_docs)]
    pub usd: f64,
    #[allow(missing_docs)]
    pub eur: f64,
    #[allow(missing_docs)]
    pub gbp: f64,
    #[allow(missing_docs)]
    pub jpy: f64,
}

impl ExchangeRates {
    /// RUNE price in `currency`
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
            Currency::Gbp => self.gbp,
            Currency::Jpy => self.jpy,
        }
    }

    /// Convert a USD value into `currency`
    ///
    /// Falls back to the USD value when the USD rate is unknown.
    pub fn convert(&self, value_usd: f64, currency: Currency) -> f64 {
        if self.usd <= 0.0 {
            return value_usd;
        }
        value_usd * self.rate(currency) / self.usd
    }
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    thorchain: ExchangeRates,
}

/// Errors specific to the spot price client
#[derive(Debug, Error)]
pub enum SpotPriceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    Status {
        #[allow(missing_docs)]
        status: u16,
        #[allow(missing_docs)]
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Timeout error
    #[error("Request timeout after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Currency code not supported
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

impl From<SpotPriceError> for ApiError {
    fn from(value: SpotPriceError) -> Self {
        match value {
            SpotPriceError::Http(error) if error.is_decode() => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            SpotPriceError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            SpotPriceError::Status { status, message } => ApiError::Status { status, message },
            SpotPriceError::RateLimited => ApiError::Status {
                status: 429,
                message: value.to_string(),
            },
            SpotPriceError::Timeout(duration) => ApiError::Timeout {
                timeout_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            },
            SpotPriceError::UnknownCurrency(_) => ApiError::Configuration {
                message: value.to_string(),
            },
        }
    }
}

/// CoinGecko client for RUNE fiat rates
#[derive(Debug, Clone)]
pub struct SpotPriceClient {
    client: Client,
    config: SpotPriceConfig,
}

impl SpotPriceClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SpotPriceConfig) -> Result<Self, SpotPriceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("thorchain-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Current RUNE price in USD, EUR, GBP and JPY
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, non-success status or
    /// an unparseable body.
    pub async fn exchange_rates(&self) -> Result<ExchangeRates, SpotPriceError> {
        let url = format!(
            "{}/simple/price",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(url, "fetching RUNE exchange rates");

        let request = self
            .client
            .get(&url)
            .query(&[("ids", "thorchain"), ("vs_currencies", "usd,eur,gbp,jpy")])
            .header("accept", "application/json");

        let response = timeout(self.config.timeout, request.send())
            .await
            .map_err(|_| SpotPriceError::Timeout(self.config.timeout))??;

        match response.status() {
            status if status.is_success() => {
                let body: SimplePriceResponse = response.json().await?;
                Ok(body.thorchain)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("CoinGecko rate limit hit");
                Err(SpotPriceError::RateLimited)
            }
            status => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!(status = status.as_u16(), message, "CoinGecko API error");
                Err(SpotPriceError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> ExchangeRates {
        ExchangeRates {
            usd: 2.0,
            eur: 1.8,
            gbp: 1.6,
            jpy: 300.0,
        }
    }

    #[test]
    fn currencies_cycle() {
        let mut currency = Currency::Usd;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(currency);
            currency = currency.next();
        }
        assert_eq!(seen, Currency::ALL);
        assert_eq!(currency, Currency::Usd);
    }

    #[test]
    fn currencies_parse_case_insensitively() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("JPY".parse::<Currency>().unwrap(), Currency::Jpy);
        assert!("chf".parse::<Currency>().is_err());
        assert_eq!(Currency::Gbp.symbol(), "£");
    }

    #[test]
    fn conversion_scales_by_rate_ratio() {
        let rates = rates();
        assert!((rates.convert(10.0, Currency::Usd) - 10.0).abs() < f64::EPSILON);
        assert!((rates.convert(10.0, Currency::Eur) - 9.0).abs() < 1e-9);
        assert!((rates.convert(10.0, Currency::Jpy) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn conversion_without_usd_rate_is_identity() {
        let rates = ExchangeRates::default();
        assert!((rates.convert(7.5, Currency::Eur) - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(SpotPriceError::RateLimited),
            ApiError::Status { status: 429, .. }
        ));
        assert_eq!(
            ApiError::from(SpotPriceError::Timeout(Duration::from_secs(10))),
            ApiError::Timeout { timeout_ms: 10_000 }
        );
    }
}
