// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-client provider health tracking

use api_client::{ApiError, ProviderHealthSnapshot};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::registry::ProviderRegistry;

#[derive(Debug, Clone, Default)]
struct ProviderHealth {
    consecutive_failures: u32,
    total_successes: u64,
    total_failures: u64,
    last_error: Option<String>,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
}

/// Consecutive-failure counters for the providers of one client
///
/// Each failover client owns exactly one tracker; trackers are never shared.
#[derive(Debug)]
pub struct HealthTracker {
    order: Vec<String>,
    providers: DashMap<String, ProviderHealth>,
    max_failures_before_demotion: u32,
}

impl HealthTracker {
    /// Create a tracker with a zeroed entry per registered provider
    pub fn new(registry: &ProviderRegistry, max_failures_before_demotion: u32) -> Self {
        let order: Vec<String> = registry
            .providers()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        let providers = order
            .iter()
            .map(|name| (name.clone(), ProviderHealth::default()))
            .collect();
        Self {
            order,
            providers,
            max_failures_before_demotion: max_failures_before_demotion.max(1),
        }
    }

    /// Failure threshold for demotion
    pub fn max_failures_before_demotion(&self) -> u32 {
        self.max_failures_before_demotion
    }

    /// Record a successful attempt, resetting the failure counter
    pub fn record_success(&self, provider: &str) {
        if let Some(mut health) = self.providers.get_mut(provider) {
            health.consecutive_failures = 0;
            health.total_successes += 1;
            health.last_success = Some(Utc::now());
        }
    }

    /// Record a failed attempt, returning the new consecutive count
    pub fn record_failure(&self, provider: &str, error: &ApiError) -> u32 {
        let Some(mut health) = self.providers.get_mut(provider) else {
            return 0;
        };
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.total_failures += 1;
        health.last_error = Some(error.to_string());
        health.last_failure = Some(Utc::now());
        health.consecutive_failures
    }

    /// Failures since the provider's last success
    pub fn consecutive_failures(&self, provider: &str) -> u32 {
        self.providers
            .get(provider)
            .map_or(0, |h| h.consecutive_failures)
    }

    /// Whether the provider has reached the demotion threshold
    pub fn is_demoted(&self, provider: &str) -> bool {
        self.consecutive_failures(provider) >= self.max_failures_before_demotion
    }

    /// Zero every consecutive-failure counter
    pub fn reset(&self) {
        for mut entry in self.providers.iter_mut() {
            entry.consecutive_failures = 0;
            entry.last_error = None;
        }
    }

    /// Snapshot of every provider in registry order
    pub fn snapshot(&self) -> Vec<ProviderHealthSnapshot> {
        self.order
            .iter()
            .filter_map(|name| {
                self.providers.get(name).map(|h| ProviderHealthSnapshot {
                    provider: name.clone(),
                    consecutive_failures: h.consecutive_failures,
                    max_failures_before_demotion: self.max_failures_before_demotion,
                    total_successes: h.total_successes,
                    total_failures: h.total_failures,
                    last_error: h.last_error.clone(),
                    last_success: h.last_success,
                    last_failure: h.last_failure,
                })
            })
            .collect()
    }
}
