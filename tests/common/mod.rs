#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Tap the Goose client integration tests.
//!
//! Provides a routing [`MockTransport`] and helper functions for building the
//! JSON bodies the game API returns.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use goose_tap_client::{ApiRequest, ApiResponse, GooseError, Method, Transport};
use serde_json::json;

// ── MockTransport ───────────────────────────────────────────────────

type Route = (Method, String);

#[derive(Default)]
struct Routes {
    responses: HashMap<Route, VecDeque<ApiResponse>>,
    delays: HashMap<Route, Duration>,
    failures: HashMap<Route, String>,
}

/// A scripted API: responses are queued per `(method, path)`.
///
/// Queued responses are consumed in order; the last one for a route is
/// replayed for every later request, which suits polling. Unknown routes
/// answer 404. Clones share routes and the request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<StdMutex<Routes>>,
    /// Every request received, in order.
    pub requests: Arc<StdMutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path`.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .responses
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ApiResponse::new(status, body));
    }

    /// Drop queued responses for a route and answer with this one from now on.
    pub fn replace(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.responses.entry((method, path.to_string())).or_default();
        queue.clear();
        queue.push_back(ApiResponse::new(status, body));
    }

    /// Delay every response on a route.
    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        self.routes
            .lock()
            .unwrap()
            .delays
            .insert((method, path.to_string()), delay);
    }

    /// Make a route fail at the transport level (no response at all).
    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .failures
            .insert((method, path.to_string()), message.to_string());
    }

    /// Requests received for `method path`.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GooseError> {
        let route = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);

        let (delay, failure, response) = {
            let mut routes = self.routes.lock().unwrap();
            let delay = routes.delays.get(&route).copied();
            let failure = routes.failures.get(&route).cloned();
            let response = routes.responses.get_mut(&route).and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            });
            (delay, failure, response)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = failure {
            return Err(GooseError::Transport(message));
        }
        Ok(response.unwrap_or_else(|| ApiResponse::new(404, r#"{"message":"no route"}"#)))
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// RFC 3339 timestamp `offset_ms` away from now.
pub fn at_offset(offset_ms: i64) -> String {
    (Utc::now() + ChronoDuration::milliseconds(offset_ms)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn round_id(n: u128) -> uuid::Uuid {
    uuid::Uuid::from_u128(n)
}

pub fn round_path(id: uuid::Uuid) -> String {
    format!("/rounds/{id}")
}

pub fn tap_path(id: uuid::Uuid) -> String {
    format!("/rounds/{id}/tap")
}

/// A round object starting and ending at the given offsets from now.
pub fn round_value(id: uuid::Uuid, start_ms: i64, end_ms: i64, total: u64) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "startTime": at_offset(start_ms),
        "endTime": at_offset(end_ms),
        "totalScore": total,
        "createdAt": at_offset(start_ms - 30_000),
    })
}

/// Body of `GET /rounds/{id}`.
pub fn detail_json(
    id: uuid::Uuid,
    start_ms: i64,
    end_ms: i64,
    total: u64,
    my: (u64, u64),
    top: &[(&str, u64, u64)],
) -> String {
    let top: Vec<_> = top
        .iter()
        .map(|(name, taps, score)| json!({"taps": taps, "score": score, "user": {"username": name}}))
        .collect();
    json!({
        "round": round_value(id, start_ms, end_ms, total),
        "topStats": top,
        "myStats": {"taps": my.0, "score": my.1},
    })
    .to_string()
}

/// Body of `GET /rounds`.
pub fn page_json(ids: &[u128], next_cursor: Option<&str>, has_more: bool) -> String {
    let data: Vec<_> = ids
        .iter()
        .map(|n| round_value(round_id(*n), -10_000, 50_000, *n as u64))
        .collect();
    json!({
        "data": data,
        "pagination": {"limit": 5, "nextCursor": next_cursor, "hasMore": has_more},
    })
    .to_string()
}

pub fn user_json(username: &str, role: &str) -> String {
    json!({"username": username, "role": role}).to_string()
}

pub fn token_json(token: &str) -> String {
    json!({"token": token, "user": {"username": "ignored"}}).to_string()
}

pub fn tap_json(taps: u64, score: u64) -> String {
    json!({"taps": taps, "score": score}).to_string()
}
