// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Scripted transport for unit tests

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use api_client::{ApiError, HttpTransport, TransportRequest, TransportResponse};

/// What the transport does for one call
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Respond with a status and body
    Status(u16, String),
    /// Fail before any response
    Fail(String),
    /// Never complete
    Hang,
}

impl Reply {
    pub(crate) fn json(body: &serde_json::Value) -> Self {
        Self::Status(200, body.to_string())
    }
}

#[derive(Debug)]
struct Route {
    queue: VecDeque<Reply>,
    fallback: Reply,
}

/// Transport answering from per-URL-prefix scripts and recording every call
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    /// Answer every call to URLs starting with `prefix` with `reply`
    pub(crate) fn route(&self, prefix: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry(prefix.to_string())
            .and_modify(|r| r.fallback = reply.clone())
            .or_insert_with(|| Route {
                queue: VecDeque::new(),
                fallback: reply,
            });
    }

    /// Answer the next call to `prefix` with `reply`, then fall back to the route
    pub(crate) fn push(&self, prefix: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry(prefix.to_string())
            .or_insert_with(|| Route {
                queue: VecDeque::new(),
                fallback: Reply::Fail("no scripted reply".to_string()),
            })
            .queue
            .push_back(reply);
    }

    /// URLs requested so far, in order
    pub(crate) fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    /// Requests sent so far, in order
    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        routes
            .iter_mut()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or_else(
                || Reply::Fail(format!("no route for {url}")),
                |(_, route)| {
                    route
                        .queue
                        .pop_front()
                        .unwrap_or_else(|| route.fallback.clone())
                },
            )
    }
}

impl HttpTransport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        let reply = self.next_reply(&request.url);
        self.calls.lock().unwrap().push(request);
        match reply {
            Reply::Status(status, body) => Ok(TransportResponse { status, body }),
            Reply::Fail(message) => Err(ApiError::Http { message }),
            Reply::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
