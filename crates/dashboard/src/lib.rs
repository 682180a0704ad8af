// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! THORChain Dashboard Server
//!
//! This crate provides the HTTP surface of the dashboard, built with Axum on
//! top of the failover-backed THORNode and Midgard clients and the background
//! pollers.
//!
//! # Module Structure
//!
//! - [`config`]: Layered configuration with validated newtypes
//! - [`error`]: Error types and HTTP response mapping of upstream failures
//! - [`state`]: Shared clients, pollers, metrics and the cancellation token
//! - [`server`]: Server lifecycle and coordinated shutdown
//! - [`routes`]: Route configuration and request handlers
//! - [`extractors`]: Path and query extractors reporting validation errors
//! - [`metrics`]: Prometheus registry, request counting and `/metrics`
//! - [`openapi`]: `OpenAPI` document for the routes
//!
//! # Key Features
//!
//! - **Failover**: every upstream call walks the provider list until one answers
//! - **Caching**: responses are served from the client cache while live
//! - **Background polling**: RUNE price and pool list refresh while the server runs
//! - **Health Monitoring**: per-provider health derived from tracked failures
//! - **Graceful Shutdown**: coordinated termination using `CancellationToken`

pub mod config;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
