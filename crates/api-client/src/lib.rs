// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request, transport and error abstractions for the failover fetch layer
//!
//! This crate holds the vocabulary shared by every upstream client in the
//! workspace, independent of which provider answers a request.
//!
//! # Core Abstractions
//!
//! - **`FetchRequest`**: what a consumer asks for (path, headers, height pinning, cache policy)
//! - **`ResponsePayload`**: the parsed answer, JSON or text, cheap to clone out of a cache
//! - **`HttpTransport` Trait**: the single network call made against one provider
//! - **`ApiError`**: the failure taxonomy shared by transports, clients and pollers
//! - **Health Types**: per-provider health snapshots and `Up`/`Degraded`/`Down` status
//!
//! # Key Features
//!
//! - **Async-First Design**: transports return `impl Future` so implementations stay `Send`
//! - **Payload Agnostic**: typed decoding happens at the consumer boundary via `ResponsePayload::decode`
//! - **Swappable Transport**: production uses reqwest, tests use scripted transports

use thiserror::Error;

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;

/// A single network call against one upstream provider
///
/// Implementations perform exactly one request and report the raw status and body.
/// Deciding whether a status counts as success, parsing, timeouts and failover are
/// the caller's job.
pub trait HttpTransport: Send + Sync {
    /// Send the request and return the raw response
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] when the request could not be sent or the body
    /// could not be read.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, ApiError>> + Send;

    /// Get the name of this transport
    fn name(&self) -> &'static str;
}

/// Errors produced by the fetch layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, TLS, body read)
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// The provider answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The body could not be parsed or decoded into the expected shape
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A single attempt exceeded its time budget
    #[error("Request timeout after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Every eligible provider was attempted and none succeeded
    #[error("All providers failed for {path}: {last_error}")]
    AllProvidersFailed { path: String, last_error: String },

    /// Provider selection returned nothing to try
    #[error("No eligible provider for {path}")]
    NoEligibleProviders { path: String },
}

impl ApiError {
    /// Whether this error describes one provider attempt rather than a whole request
    ///
    /// Attempt-level errors are absorbed by failover and only ever surface
    /// wrapped in [`ApiError::AllProvidersFailed`].
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::Status { .. }
                | Self::InvalidResponse { .. }
                | Self::Timeout { .. }
        )
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
