// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! Server lifecycle errors and the HTTP mapping of upstream failures.

use std::net::SocketAddr;

use api_client::ApiError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use external_apis::SpotPriceError;
use thiserror::Error;
use tracing::warn;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Upstream fetch failed
    #[error(transparent)]
    Upstream(#[from] ApiError),

    /// Optional upstream switched off in configuration
    #[error("{name} is disabled")]
    Disabled {
        /// Feature name
        name: &'static str,
    },

    /// Bad path or query input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Requested item does not exist upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Metrics could not be registered or encoded
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<SpotPriceError> for ServerError {
    fn from(value: SpotPriceError) -> Self {
        Self::Upstream(value.into())
    }
}

impl ServerError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(err) => match err {
                ApiError::AllProvidersFailed { .. }
                | ApiError::Http { .. }
                | ApiError::Status { .. }
                | ApiError::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
                ApiError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ApiError::NoEligibleProviders { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ApiError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Disabled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError(..) => StatusCode::BAD_REQUEST,
            Self::NotFound(..) => StatusCode::NOT_FOUND,
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::Metrics(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_map_to_gateway_statuses() {
        let exhausted = ServerError::from(ApiError::AllProvidersFailed {
            path: "/thorchain/pools".to_string(),
            last_error: "HTTP 500: oops".to_string(),
        });
        assert_eq!(exhausted.status_code(), StatusCode::BAD_GATEWAY);

        let ineligible = ServerError::from(ApiError::NoEligibleProviders {
            path: "/thorchain/pool/BTC.BTC".to_string(),
        });
        assert_eq!(ineligible.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let timeout = ServerError::from(SpotPriceError::Timeout(std::time::Duration::from_secs(1)));
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn input_errors_are_client_errors() {
        assert_eq!(
            ServerError::ValidationError("bad chain".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::NotFound("inbound address".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Disabled { name: "spot prices" }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn response_body_carries_message_and_status() {
        let response = ServerError::from(ApiError::AllProvidersFailed {
            path: "/thorchain/network".to_string(),
            last_error: "HTTP 503: unavailable".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
