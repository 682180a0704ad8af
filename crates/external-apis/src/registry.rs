// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream provider descriptors and provider selection
//!
//! A [`ProviderRegistry`] is an immutable, priority-sorted list of [`Provider`]s.
//! [`ProviderRegistry::select`] turns a request plus the caller's view of provider
//! health into the order in which providers are attempted. Selection is pure: it
//! reads health, it never changes it.

use std::{collections::BTreeMap, time::Duration};

use api_client::{ApiError, FetchRequest};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 6;

/// One upstream endpoint serving the same REST API as its peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique name within a registry
    pub name: String,
    /// Base URL, request paths are appended to it
    pub base_url: Url,
    /// Headers sent with every request to this provider
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    /// How often the provider's data refreshes upstream
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// Accepts a `height` query parameter for historical state
    #[serde(default)]
    pub supports_height_query: bool,
    /// Only serves height-pinned requests
    #[serde(default)]
    pub historical_only: bool,
    /// Lower is preferred
    pub priority: u32,
}

fn default_update_interval_secs() -> u64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

impl Provider {
    /// Create a provider serving latest state
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        priority: u32,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let base_url = Url::parse(base_url).map_err(|e| RegistryError::InvalidBaseUrl {
            name: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name,
            base_url,
            extra_headers: BTreeMap::new(),
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            supports_height_query: false,
            historical_only: false,
            priority,
        })
    }

    /// Add a header sent with every request to this provider
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.extra_headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the nominal upstream refresh interval
    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval_secs = interval.as_secs();
        self
    }

    /// Mark the provider as accepting `height` queries
    #[must_use]
    pub fn with_height_query(mut self) -> Self {
        self.supports_height_query = true;
        self
    }

    /// Mark the provider as an archive only used for height-pinned requests
    #[must_use]
    pub fn historical_only(mut self) -> Self {
        self.supports_height_query = true;
        self.historical_only = true;
        self
    }

    /// Nominal upstream refresh interval
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Full URL for `request` on this provider
    ///
    /// Appends `height=<h>` when the request is pinned and the provider supports it.
    pub fn url_for(&self, request: &FetchRequest) -> String {
        let mut url = format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path
        );
        if let Some(height) = request.target_height
            && self.supports_height_query
        {
            let separator = if request.path.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str("height=");
            url.push_str(&height.to_string());
        }
        url
    }

    /// Provider headers overlaid with request headers
    pub fn headers_for(&self, request: &FetchRequest) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = self
            .extra_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        headers.extend(
            request
                .headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.clone())),
        );
        headers
    }
}

/// Error type for registry construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum RegistryError {
    /// No providers given
    #[error("Provider registry must contain at least one provider")]
    Empty,

    /// Two providers share a name
    #[error("Duplicate provider name: {name}")]
    DuplicateProvider { name: String },

    /// Base URL did not parse
    #[error("Invalid base URL for provider {name}: {message}")]
    InvalidBaseUrl { name: String, message: String },
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        ApiError::Configuration {
            message: error.to_string(),
        }
    }
}

/// Immutable, priority-ordered set of providers for one upstream API
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    /// Build a registry, sorting providers by priority
    ///
    /// Providers with equal priority keep their given order.
    ///
    /// # Errors
    ///
    /// Returns an error if `providers` is empty or names are not unique.
    pub fn new(mut providers: Vec<Provider>) -> Result<Self, RegistryError> {
        if providers.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (index, provider) in providers.iter().enumerate() {
            if providers[..index].iter().any(|p| p.name == provider.name) {
                return Err(RegistryError::DuplicateProvider {
                    name: provider.name.clone(),
                });
            }
        }
        providers.sort_by_key(|p| p.priority);
        Ok(Self { providers })
    }

    /// All providers in priority order
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Order in which providers are attempted for `request`
    ///
    /// - Height-pinned: only height-capable providers, by priority.
    /// - `prefer_secondary`: the second latest-state provider, then the first, then the rest.
    /// - Otherwise: latest-state providers by priority with demoted ones moved last,
    ///   keeping their relative order.
    ///
    /// Demoted providers are reordered, never removed.
    pub fn select<F>(&self, request: &FetchRequest, is_demoted: F) -> Vec<&Provider>
    where
        F: Fn(&Provider) -> bool,
    {
        if request.target_height.is_some() {
            return self
                .providers
                .iter()
                .filter(|p| p.supports_height_query)
                .collect();
        }

        let mut latest: Vec<&Provider> =
            self.providers.iter().filter(|p| !p.historical_only).collect();

        if request.prefer_secondary {
            if latest.len() > 1 {
                latest.swap(0, 1);
            }
            return latest;
        }

        let (healthy, demoted): (Vec<&Provider>, Vec<&Provider>) =
            latest.into_iter().partition(|p| !is_demoted(p));
        healthy.into_iter().chain(demoted).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(selected: &[&Provider]) -> Vec<String> {
        selected.iter().map(|p| p.name.clone()).collect()
    }

    fn thornode_like() -> ProviderRegistry {
        ProviderRegistry::new(vec![
            Provider::new("archive", "https://archive.example.com", 3)
                .unwrap()
                .historical_only(),
            Provider::new("primary", "https://primary.example.com", 1).unwrap(),
            Provider::new("secondary", "https://secondary.example.com/", 2)
                .unwrap()
                .with_header("X-Client-Id", "dashboard"),
        ])
        .unwrap()
    }

    #[test]
    fn registry_is_sorted_by_priority() {
        let registry = thornode_like();
        let order: Vec<_> = registry.providers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, ["primary", "secondary", "archive"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("secondary").is_some());
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert_eq!(
            ProviderRegistry::new(vec![]).unwrap_err(),
            RegistryError::Empty
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ProviderRegistry::new(vec![
            Provider::new("a", "https://a.example.com", 1).unwrap(),
            Provider::new("a", "https://b.example.com", 2).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateProvider {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Provider::new("bad", "not a url", 1).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBaseUrl { .. }));
        let api_error: ApiError = err.into();
        assert!(matches!(api_error, ApiError::Configuration { .. }));
    }

    #[test]
    fn default_selection_is_primary_first_without_archive() {
        let registry = thornode_like();
        let request = FetchRequest::get("/thorchain/network");
        assert_eq!(
            names(&registry.select(&request, |_| false)),
            ["primary", "secondary"]
        );
    }

    #[test]
    fn demoted_primary_moves_behind_healthy_providers() {
        let registry = thornode_like();
        let request = FetchRequest::get("/thorchain/network");
        let selected = registry.select(&request, |p| p.name == "primary");
        assert_eq!(names(&selected), ["secondary", "primary"]);
    }

    #[test]
    fn all_demoted_keeps_priority_order() {
        let registry = thornode_like();
        let request = FetchRequest::get("/thorchain/network");
        let selected = registry.select(&request, |_| true);
        assert_eq!(names(&selected), ["primary", "secondary"]);
    }

    #[test]
    fn prefer_secondary_ignores_health() {
        let registry = thornode_like();
        let request = FetchRequest::get("/thorchain/pools").prefer_secondary(true);
        let selected = registry.select(&request, |p| p.name == "secondary");
        assert_eq!(names(&selected), ["secondary", "primary"]);
    }

    #[test]
    fn prefer_secondary_with_single_provider() {
        let registry =
            ProviderRegistry::new(vec![Provider::new("only", "https://only.example.com", 1).unwrap()])
                .unwrap();
        let request = FetchRequest::get("/x").prefer_secondary(true);
        assert_eq!(names(&registry.select(&request, |_| false)), ["only"]);
    }

    #[test]
    fn height_requests_only_use_height_capable_providers() {
        let registry = thornode_like();
        let request = FetchRequest::get("/thorchain/pools").at_height(100);
        assert_eq!(names(&registry.select(&request, |_| true)), ["archive"]);
    }

    #[test]
    fn height_request_without_archive_selects_nothing() {
        let registry =
            ProviderRegistry::new(vec![Provider::new("only", "https://only.example.com", 1).unwrap()])
                .unwrap();
        let request = FetchRequest::get("/x").at_height(5);
        assert!(registry.select(&request, |_| false).is_empty());
    }

    #[test]
    fn url_appends_height_with_correct_separator() {
        let archive = Provider::new("archive", "https://archive.example.com/", 1)
            .unwrap()
            .historical_only();
        let plain = FetchRequest::get("/thorchain/pool/BTC.BTC").at_height(42);
        assert_eq!(
            archive.url_for(&plain),
            "https://archive.example.com/thorchain/pool/BTC.BTC?height=42"
        );

        let with_query = FetchRequest::get("/thorchain/nodes?status=active").at_height(42);
        assert_eq!(
            archive.url_for(&with_query),
            "https://archive.example.com/thorchain/nodes?status=active&height=42"
        );
    }

    #[test]
    fn url_keeps_base_path() {
        let midgard = Provider::new("midgard", "https://midgard.example.com/v2", 1).unwrap();
        assert_eq!(
            midgard.url_for(&FetchRequest::get("/stats")),
            "https://midgard.example.com/v2/stats"
        );
    }

    #[test]
    fn request_headers_override_provider_headers() {
        let provider = Provider::new("p", "https://p.example.com", 1)
            .unwrap()
            .with_header("X-Client-Id", "provider")
            .with_header("Accept", "application/json");
        let request = FetchRequest::get("/x").with_header("x-client-id", "request");
        let headers = provider.headers_for(&request);
        assert_eq!(headers.get("x-client-id").map(String::as_str), Some("request"));
        assert_eq!(
            headers.get("accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn provider_deserializes_with_defaults() {
        let provider: Provider = serde_json::from_value(serde_json::json!({
            "name": "liquify",
            "base_url": "https://thornode.thorchain.liquify.com",
            "priority": 1
        }))
        .unwrap();
        assert!(provider.extra_headers.is_empty());
        assert!(!provider.supports_height_query);
        assert_eq!(provider.update_interval(), Duration::from_secs(6));
    }
}
