// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! Query and path rejections are reported through [`ServerError`] so every
//! client error carries the same JSON body as upstream failures.

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

/// Query string extractor rejecting with a validation error
#[derive(Debug)]
pub struct QueryExtractor<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| {
                ServerError::ValidationError(format!("invalid query string: {}", rejection.body_text()))
            })
    }
}

/// Path parameter extractor rejecting with a validation error
#[derive(Debug)]
pub struct PathExtractor<T>(pub T);

impl<T, S> FromRequestParts<S> for PathExtractor<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| {
                ServerError::ValidationError(format!("invalid path: {}", rejection.body_text()))
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct HeightQuery {
        height: Option<u64>,
    }

    async fn extract(uri: &str) -> Result<HeightQuery, ServerError> {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        QueryExtractor::<HeightQuery>::from_request_parts(&mut parts, &())
            .await
            .map(|QueryExtractor(q)| q)
    }

    #[tokio::test]
    async fn valid_query_is_parsed() {
        assert_eq!(extract("/v1/pools/BTC.BTC?height=100").await.unwrap().height, Some(100));
        assert_eq!(extract("/v1/pools/BTC.BTC").await.unwrap().height, None);
    }

    #[tokio::test]
    async fn malformed_query_is_a_validation_error() {
        let err = extract("/v1/pools/BTC.BTC?height=tip").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("invalid query string"));
    }
}
