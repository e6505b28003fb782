//! Typed client for the Tap the Goose HTTP API.
//!
//! [`ApiClient`] turns each endpoint into an async method, attaches the bearer
//! token, and maps non-success statuses onto [`GooseError`] variants. It is a
//! cheap handle: clones share the transport and the token.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{GooseError, Result};
use crate::protocol::{
    ApiErrorBody, LoginRequest, LoginResponse, Round, RoundDetail, RoundId, RoundsPage, TapResult,
    User,
};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Message shown on the login form when the server gives none.
pub(crate) const DEFAULT_LOGIN_ERROR: &str = "login failed";

/// Async handle to the game API.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a client over any [`Transport`].
    pub fn new(transport: impl Transport) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Create a client over an already shared transport.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a client over the built-in HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`GooseError::Transport`] if the HTTP client cannot be built.
    #[cfg(feature = "transport-http")]
    pub fn connect(config: &crate::config::ClientConfig) -> Result<Self> {
        let http = crate::transports::HttpTransport::new(&config.base_url, config.request_timeout)?;
        Ok(Self::new(http))
    }

    // ── Token ───────────────────────────────────────────────────────

    /// Set (or clear) the bearer token sent with every request.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ── Auth ────────────────────────────────────────────────────────

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Any non-success status becomes [`GooseError::Authentication`] carrying
    /// the server's message, suitable for inline display.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let body = serde_json::to_string(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let response = self
            .transport
            .execute(ApiRequest::new(Method::Post, "/auth/login").with_body(body))
            .await?;

        if !response.is_success() {
            let message = error_message(&response)
                .unwrap_or_else(|| DEFAULT_LOGIN_ERROR.to_string());
            debug!(status = response.status, "login rejected");
            return Err(GooseError::Authentication { message });
        }
        decode(&response)
    }

    /// `GET /auth/me`.
    pub async fn me(&self) -> Result<User> {
        self.call(ApiRequest::new(Method::Get, "/auth/me")).await
    }

    /// `POST /auth/logout`. The response body is ignored.
    pub async fn logout(&self) -> Result<()> {
        let response = self
            .send(ApiRequest::new(Method::Post, "/auth/logout"))
            .await?;
        check_status(&response)
    }

    // ── Rounds ──────────────────────────────────────────────────────

    /// `GET /rounds?cursor&limit`. The cursor is omitted for the first page.
    pub async fn list_rounds(&self, cursor: Option<&str>, limit: u32) -> Result<RoundsPage> {
        let mut request = ApiRequest::new(Method::Get, "/rounds");
        if let Some(cursor) = cursor {
            request = request.with_query("cursor", cursor);
        }
        request = request.with_query("limit", limit.to_string());
        self.call(request).await
    }

    /// `GET /rounds/{id}`.
    pub async fn get_round(&self, id: RoundId) -> Result<RoundDetail> {
        self.call(ApiRequest::new(Method::Get, format!("/rounds/{id}")))
            .await
    }

    /// `POST /rounds`. Only privileged users may create rounds.
    pub async fn create_round(&self) -> Result<Round> {
        self.call(ApiRequest::new(Method::Post, "/rounds")).await
    }

    /// `POST /rounds/{id}/tap`. Fails unless the round is active server-side.
    pub async fn tap(&self, id: RoundId) -> Result<TapResult> {
        self.call(ApiRequest::new(Method::Post, format!("/rounds/{id}/tap")))
            .await
    }

    // ── Internal helpers ────────────────────────────────────────────

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let token = self.token.read().await.clone();
        self.transport
            .execute(request.with_bearer_token(token))
            .await
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        check_status(&response)?;
        decode(&response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

/// Map a non-success status onto the error taxonomy.
fn check_status(response: &ApiResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let err = match response.status {
        401 => GooseError::Unauthorized,
        403 => GooseError::Forbidden,
        404 => GooseError::NotFound,
        status => GooseError::Api {
            status,
            message: error_message(response).unwrap_or_else(|| response.body.clone()),
        },
    };
    warn!(status = response.status, "API request failed: {err}");
    Err(err)
}

fn error_message(response: &ApiResponse) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.message)
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!("failed to decode API response: {e}");
        GooseError::Serialization(e)
    })
}
