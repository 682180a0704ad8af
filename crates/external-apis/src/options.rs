// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-call options shared by the typed clients

use api_client::FetchRequest;
use serde::{Deserialize, Deserializer, de};
use url::form_urlencoded;

/// Options accepted by every typed client method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Pin the query to a block height
    pub height: Option<u64>,
    /// Try the secondary provider first
    pub prefer_secondary: bool,
    /// Allow the response to be cached
    pub cache: bool,
    /// Skip the cache read but store the fresh result
    pub bypass_cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            height: None,
            prefer_secondary: false,
            cache: true,
            bypass_cache: false,
        }
    }
}

impl RequestOptions {
    /// Options for a height-pinned query
    pub fn at_height(height: u64) -> Self {
        Self {
            height: Some(height),
            ..Self::default()
        }
    }

    /// Options preferring the secondary provider
    pub fn prefer_secondary() -> Self {
        Self {
            prefer_secondary: true,
            ..Self::default()
        }
    }

    /// Options skipping the cache read
    pub fn fresh() -> Self {
        Self {
            bypass_cache: true,
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, request: FetchRequest) -> FetchRequest {
        request
            .at_optional_height(self.height)
            .prefer_secondary(self.prefer_secondary)
            .cacheable(self.cache)
            .bypass_cache(self.bypass_cache)
    }
}

/// Percent-encode one path segment
pub(crate) fn segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Append a query string built from `pairs`, skipping absent values
pub(crate) fn with_query<'a, I>(path: &str, pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<String>)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        if let Some(value) = value {
            serializer.append_pair(key, &value);
            any = true;
        }
    }
    if any {
        format!("{path}?{}", serializer.finish())
    } else {
        path.to_string()
    }
}

/// Deserialize an integer amount that upstream APIs encode as a string or a number
pub(crate) fn amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(u128::from(n)),
        Raw::Text(s) if s.is_empty() => Ok(0),
        Raw::Text(s) => s.parse().map_err(de::Error::custom),
    }
}

/// Like [`amount`] for heights, counts and timestamps
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = amount(deserializer)?;
    u64::try_from(value).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_cacheable_latest() {
        let request = RequestOptions::default().apply(FetchRequest::get("/x"));
        assert!(request.cacheable);
        assert!(!request.bypass_cache);
        assert_eq!(request.target_height, None);
    }

    #[test]
    fn options_map_onto_request() {
        let request = RequestOptions::at_height(9).apply(FetchRequest::get("/x"));
        assert_eq!(request.target_height, Some(9));

        let request = RequestOptions::prefer_secondary().apply(FetchRequest::get("/x"));
        assert!(request.prefer_secondary);

        let request = RequestOptions::fresh().apply(FetchRequest::get("/x"));
        assert!(request.bypass_cache);
    }

    #[test]
    fn query_skips_missing_values() {
        assert_eq!(with_query("/history/swaps", [("interval", None)]), "/history/swaps");
        assert_eq!(
            with_query(
                "/history/swaps",
                [
                    ("interval", Some("day".to_string())),
                    ("count", None),
                    ("from", Some("1700000000".to_string()))
                ]
            ),
            "/history/swaps?interval=day&from=1700000000"
        );
    }

    #[test]
    fn segments_are_encoded() {
        assert_eq!(segment("BTC.BTC"), "BTC.BTC");
        assert_eq!(segment("a/b"), "a%2Fb");
    }

    #[test]
    fn amounts_accept_strings_and_numbers() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "amount")]
            value: u128,
        }

        let parsed: Wrapper = serde_json::from_str(r#"{"value": "123456789012"}"#).unwrap();
        assert_eq!(parsed.value, 123_456_789_012);
        let parsed: Wrapper = serde_json::from_str(r#"{"value": 42}"#).unwrap();
        assert_eq!(parsed.value, 42);
        assert!(serde_json::from_str::<Wrapper>(r#"{"value": "abc"}"#).is_err());
    }
}
