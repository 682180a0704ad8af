// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! reqwest-backed [`HttpTransport`]

use std::time::Duration;

use api_client::{ApiError, HttpMethod, HttpTransport, TransportRequest, TransportResponse};
use reqwest::{Client, Method};
use tracing::trace;

const USER_AGENT: &str = concat!("thorchain-dashboard/", env!("CARGO_PKG_VERSION"));

/// Production transport using a shared reqwest connection pool
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, err: &reqwest::Error, context: &str) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ApiError::Http {
                message: format!("{context}{err}"),
            }
        }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.classify(&e, ""))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify(&e, "failed to read response body: "))?;

        trace!(url = %request.url, status, bytes = body.len(), "received response");
        Ok(TransportResponse { status, body })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    fn get(server: &MockServer, route: &str) -> TransportRequest {
        TransportRequest {
            method: HttpMethod::Get,
            url: format!("{}{route}", server.uri()),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thorchain/mimir"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport.send(get(&server, "/thorchain/mimir")).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.body, "busy");
    }

    #[tokio::test]
    async fn hung_server_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thorchain/network"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_millis(200)).unwrap();
        let err = transport
            .send(get(&server, "/thorchain/network"))
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::Timeout { timeout_ms: 200 });
        assert_eq!(err.to_string(), "Request timeout after 200 ms");
    }

    #[tokio::test]
    async fn refused_connection_is_an_http_error() {
        let server = MockServer::start().await;
        let request = get(&server, "/thorchain/network");
        drop(server);

        let transport = ReqwestTransport::new(Duration::from_secs(1)).unwrap();
        let err = transport.send(request).await.unwrap_err();

        assert!(matches!(err, ApiError::Http { .. }), "{err:?}");
    }
}
