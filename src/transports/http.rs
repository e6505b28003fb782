//! HTTP transport implementation using `reqwest`.
//!
//! This module provides [`HttpTransport`], a [`Transport`] implementation that
//! sends each [`ApiRequest`] as an HTTP request against a base URL. Both
//! `http://` and `https://` are supported; TLS is provided by rustls.
//!
//! # Feature gate
//!
//! This module is only available when the `transport-http` feature is enabled
//! (it is enabled by default).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use crate::error::GooseError;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// A [`Transport`] backed by a shared `reqwest` connection pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Arc<str>,
}

impl HttpTransport {
    /// Build a transport for the given API base URL.
    ///
    /// `timeout` bounds each request from connect to the end of the body.
    ///
    /// # Errors
    ///
    /// Returns [`GooseError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GooseError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GooseError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::from_client(client, base_url))
    }

    /// Wrap an already configured `reqwest` client (custom proxy, headers, TLS).
    pub fn from_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        }
    }

    /// The base URL every request path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GooseError> {
        let url = self.url(&request.path);
        tracing::debug!(method = %request.method, url = %url, "sending API request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = request.bearer_token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        tracing::debug!(url = %url, status, "API response received");
        Ok(ApiResponse { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GooseError {
    if err.is_timeout() {
        GooseError::Timeout
    } else {
        GooseError::Transport(err.to_string())
    }
}
