// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health status types for upstream providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of consecutive failures after which a provider is demoted
pub const DEFAULT_MAX_FAILURES_BEFORE_DEMOTION: u32 = 3;

/// Health status of an upstream provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Last attempt succeeded
    Up,
    /// Recent attempts failed but the provider is still tried first
    Degraded { reason: String },
    /// Demoted behind healthy providers
    Down { reason: String },
}

impl HealthStatus {
    /// Check if this health status indicates the provider is still preferred
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Check if this health status indicates the provider is demoted
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Provider is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }
}

/// Point-in-time view of one provider's health as tracked by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealthSnapshot {
    /// Provider name
    pub provider: String,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Threshold at which the provider is demoted
    pub max_failures_before_demotion: u32,
    /// Successful attempts since the client was created
    pub total_successes: u64,
    /// Failed attempts since the client was created
    pub total_failures: u64,
    /// Message of the most recent failure
    pub last_error: Option<String>,
    /// When the provider last succeeded
    pub last_success: Option<DateTime<Utc>>,
    /// When the provider last failed
    pub last_failure: Option<DateTime<Utc>>,
}

impl ProviderHealthSnapshot {
    /// Whether the provider is currently ordered behind healthy providers
    pub fn is_demoted(&self) -> bool {
        self.consecutive_failures >= self.max_failures_before_demotion
    }

    /// Summarise the counters as a [`HealthStatus`]
    pub fn status(&self) -> HealthStatus {
        let last_error = self.last_error.as_deref().unwrap_or("unknown error");
        if self.consecutive_failures == 0 {
            HealthStatus::Up
        } else if self.is_demoted() {
            HealthStatus::Down {
                reason: format!(
                    "{} consecutive failures, last: {last_error}",
                    self.consecutive_failures
                ),
            }
        } else {
            HealthStatus::Degraded {
                reason: format!(
                    "{} of {} failures before demotion, last: {last_error}",
                    self.consecutive_failures, self.max_failures_before_demotion
                ),
            }
        }
    }
}
