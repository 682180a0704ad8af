// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request and response types for the fetch layer

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::ApiError;

/// HTTP method of a fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseAs {
    /// Parse as JSON
    #[default]
    Json,
    /// Keep the raw text
    Text,
}

/// A request issued through the failover client
///
/// Built with [`FetchRequest::get`] and the `with_*` helpers:
///
/// ```
/// use api_client::FetchRequest;
///
/// let request = FetchRequest::get("/thorchain/pool/BTC.BTC")
///     .at_height(17_000_000)
///     .with_header("X-Client-Id", "dashboard");
/// assert_eq!(request.cache_key(), "/thorchain/pool/BTC.BTC:17000000");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Path appended to the provider base URL, may carry a query string
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers with lowercase names, applied over provider headers
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body for non-GET requests
    pub body: Option<serde_json::Value>,
    /// Whether the response may be served from and stored in the cache
    pub cacheable: bool,
    /// Skip the cache read but still store the fresh result
    pub bypass_cache: bool,
    /// Block height to pin the query to
    pub target_height: Option<u64>,
    /// Try the secondary provider before the primary
    pub prefer_secondary: bool,
    /// How the body is parsed
    pub parse_as: ParseAs,
}

impl FetchRequest {
    /// Create a request with the given method and path
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            path,
            method,
            headers: BTreeMap::new(),
            body: None,
            cacheable: true,
            bypass_cache: false,
            target_height: None,
            prefer_secondary: false,
            parse_as: ParseAs::Json,
        }
    }

    /// Create a cacheable GET request for a JSON resource
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Add a header; names are case-insensitive
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Pin the query to a block height
    #[must_use]
    pub fn at_height(mut self, height: u64) -> Self {
        self.target_height = Some(height);
        self
    }

    /// Pin the query to a block height when one is given
    #[must_use]
    pub fn at_optional_height(mut self, height: Option<u64>) -> Self {
        self.target_height = height;
        self
    }

    /// Prefer the secondary provider
    #[must_use]
    pub fn prefer_secondary(mut self, prefer: bool) -> Self {
        self.prefer_secondary = prefer;
        self
    }

    /// Enable or disable caching for this request
    #[must_use]
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Skip the cache read for this call
    #[must_use]
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Keep the body as text instead of parsing JSON
    #[must_use]
    pub fn as_text(mut self) -> Self {
        self.parse_as = ParseAs::Text;
        self
    }

    /// Key under which the response is cached
    ///
    /// `path:height`, or `path:latest` when no height is pinned. Non-GET
    /// requests are prefixed with their method so they never collide with reads.
    pub fn cache_key(&self) -> String {
        let height = self
            .target_height
            .map_or_else(|| "latest".to_string(), |h| h.to_string());
        match self.method {
            HttpMethod::Get => format!("{}:{height}", self.path),
            method => format!("{method} {}:{height}", self.path),
        }
    }
}

/// A fully resolved request for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL including any height parameter
    pub url: String,
    /// Merged headers
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body
    pub body: Option<serde_json::Value>,
}

/// Raw response from one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A parsed response body
///
/// Contents are reference counted so cache reads hand out cheap clones.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Parsed JSON document
    Json(Arc<serde_json::Value>),
    /// Raw text body
    Text(Arc<str>),
}

impl ResponsePayload {
    /// Parse a response body according to `parse_as`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResponse`] if JSON parsing fails.
    pub fn parse(body: &str, parse_as: ParseAs) -> Result<Self, ApiError> {
        match parse_as {
            ParseAs::Json => serde_json::from_str(body)
                .map(|value| Self::Json(Arc::new(value)))
                .map_err(|e| ApiError::invalid_response(format!("expected JSON body: {e}"))),
            ParseAs::Text => Ok(Self::Text(Arc::from(body))),
        }
    }

    /// The JSON document, if this payload was parsed as JSON
    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The raw text, if this payload was kept as text
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Decode the payload into a typed value
    ///
    /// Text payloads are parsed as JSON first, so `"42"` decodes into a number.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResponse`] if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let result = match self {
            Self::Json(value) => T::deserialize(value.as_ref()),
            Self::Text(text) => serde_json::from_str(text.trim()),
        };
        result.map_err(|e| {
            ApiError::invalid_response(format!(
                "could not decode {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }
}

impl From<serde_json::Value> for ResponsePayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn paths_are_rooted() {
        assert_eq!(FetchRequest::get("thorchain/network").path, "/thorchain/network");
        assert_eq!(FetchRequest::get("/thorchain/network").path, "/thorchain/network");
    }

    #[test]
    fn cache_key_distinguishes_heights() {
        let latest = FetchRequest::get("/thorchain/pools");
        let pinned = FetchRequest::get("/thorchain/pools").at_height(100);
        assert_eq!(latest.cache_key(), "/thorchain/pools:latest");
        assert_eq!(pinned.cache_key(), "/thorchain/pools:100");
        assert_ne!(latest.cache_key(), pinned.cache_key());
    }

    #[test]
    fn cache_key_separates_methods() {
        let post = FetchRequest::new(HttpMethod::Post, "/quote").with_body(json!({"a": 1}));
        assert_eq!(post.cache_key(), "POST /quote:latest");
    }

    #[test]
    fn header_names_are_lowercased() {
        let request = FetchRequest::get("/x")
            .with_header("X-Client-ID", "a")
            .with_header("x-client-id", "b");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers.get("x-client-id").map(String::as_str), Some("b"));
    }

    #[test]
    fn defaults_are_cacheable_json_get() {
        let request = FetchRequest::get("/x");
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.cacheable);
        assert!(!request.bypass_cache);
        assert!(!request.prefer_secondary);
        assert_eq!(request.parse_as, ParseAs::Json);
        assert_eq!(request.target_height, None);
    }

    #[test]
    fn parse_json_and_text() {
        let payload = ResponsePayload::parse(r#"{"bond": "100"}"#, ParseAs::Json).unwrap();
        assert_eq!(payload.json(), Some(&json!({"bond": "100"})));
        assert_eq!(payload.text(), None);

        let payload = ResponsePayload::parse("12345", ParseAs::Text).unwrap();
        assert_eq!(payload.text(), Some("12345"));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let err = ResponsePayload::parse("<html>", ParseAs::Json).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn decode_typed_values() {
        #[derive(Deserialize)]
        struct Block {
            height: u64,
        }

        let payload = ResponsePayload::from(json!({"height": 42}));
        let block: Block = payload.decode().unwrap();
        assert_eq!(block.height, 42);

        let text = ResponsePayload::parse(" 7 \n", ParseAs::Text).unwrap();
        assert_eq!(text.decode::<u64>().unwrap(), 7);

        assert!(payload.decode::<Vec<u8>>().is_err());
    }

    #[test]
    fn success_status_range() {
        let ok = TransportResponse {
            status: 204,
            body: String::new(),
        };
        let redirect = TransportResponse {
            status: 301,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
