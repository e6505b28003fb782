//! Transport abstraction for the Tap the Goose API.
//!
//! The [`Transport`] trait executes one request/response exchange against the
//! game API. Bodies travel as JSON text; the [`ApiClient`](crate::api::ApiClient)
//! does all encoding, decoding and status interpretation, so a transport only
//! has to move bytes and report the status code.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use goose_tap_client::error::GooseError;
//! use goose_tap_client::transport::{ApiRequest, ApiResponse, Transport};
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GooseError> {
//!         // Perform the HTTP exchange with your client of choice
//!         # let _ = request;
//!         Ok(ApiResponse::new(200, "{}"))
//!     }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::error::GooseError;

/// HTTP method used by the game API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A single API request, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path beginning with `/`, e.g. `/rounds/…/tap`.
    pub path: String,
    /// Query parameters in the order they should be sent.
    pub query: Vec<(String, String)>,
    /// Serialized JSON body, if any.
    pub body: Option<String>,
    /// Bearer token to send in the `Authorization` header.
    pub bearer_token: Option<String>,
}

impl ApiRequest {
    /// Create a request without query, body or token.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer_token: None,
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }
}

/// The raw outcome of an exchange: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request/response transport for the Tap the Goose API.
///
/// Implementations must report every response the server produced, including
/// 4xx and 5xx statuses, as `Ok(ApiResponse)`. `Err` is reserved for
/// failures where no response exists (connection refused, timeout, TLS).
///
/// # Object Safety
///
/// This trait is object-safe; the [`ApiClient`](crate::api::ApiClient) stores
/// it as `Arc<dyn Transport>` so that session and watcher handles can share it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`GooseError::Transport`] or [`GooseError::Timeout`] when the
    /// request could not be completed.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GooseError>;
}
