//! Authenticated session lifecycle.
//!
//! [`SessionStore`] owns the login state machine:
//!
//! ```text
//! Unauthenticated ──login──▶ Loading ──▶ Authenticated
//!        ▲                      │              │
//!        └──────── failure ─────┘◀──logout─────┘
//! ```
//!
//! On startup [`restore`](SessionStore::restore) trusts a persisted profile
//! just long enough to avoid a loading flash, then re-validates the token
//! with `GET /auth/me`; a rejected token forces a logout.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, DEFAULT_LOGIN_ERROR};
use crate::error::{GooseError, Result};
use crate::protocol::User;
use crate::rounds::PhasedRound;
use crate::storage::{clear_session, load_session, save_token, save_user, SessionStorage};
use crate::watcher::StopReason;

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A login or a token validation without a cached profile is in progress.
    Loading,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Process-wide session: the API handle, persisted storage and current state.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn SessionStorage>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a store in the `Unauthenticated` state. Call [`restore`](Self::restore) next.
    pub fn new(api: ApiClient, storage: impl SessionStorage) -> Self {
        Self::with_shared_storage(api, Arc::new(storage))
    }

    pub fn with_shared_storage(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            api,
            storage,
            state_tx,
        }
    }

    /// Restore a persisted session, if any, and re-validate it remotely.
    ///
    /// Returns the state after validation. Failures never propagate: an
    /// unreadable store or a rejected token both end in `Unauthenticated`.
    pub async fn restore(&self) -> SessionState {
        let persisted = match load_session(self.storage.as_ref()) {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!("failed to read persisted session: {e}");
                self.logout().await;
                return self.state();
            }
        };

        let Some(token) = persisted.token else {
            debug!("no persisted session");
            self.set_state(SessionState::Unauthenticated);
            return self.state();
        };

        self.api.set_token(Some(token)).await;
        match persisted.user {
            Some(user) => {
                debug!(username = %user.username, "restored cached user, re-validating");
                self.set_state(SessionState::Authenticated(user));
            }
            None => self.set_state(SessionState::Loading),
        }

        match self.api.me().await {
            Ok(user) => {
                if let Err(e) = save_user(self.storage.as_ref(), &user) {
                    warn!("failed to persist validated user: {e}");
                }
                info!(username = %user.username, "session validated");
                self.set_state(SessionState::Authenticated(user));
            }
            Err(e) => {
                info!("persisted session rejected: {e}");
                self.logout().await;
            }
        }
        self.state()
    }

    /// Log in with credentials.
    ///
    /// # Errors
    ///
    /// Always [`GooseError::Authentication`] on failure, with a message fit
    /// for the login form. The store is left `Unauthenticated`.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        self.set_state(SessionState::Loading);
        match self.try_login(username, password).await {
            Ok(user) => {
                info!(username = %user.username, "logged in");
                self.set_state(SessionState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!("login failed: {e}");
                self.api.set_token(None).await;
                if let Err(clear_err) = clear_session(self.storage.as_ref()) {
                    warn!("failed to clear session storage: {clear_err}");
                }
                self.set_state(SessionState::Unauthenticated);
                Err(match e {
                    GooseError::Authentication { message } => GooseError::Authentication { message },
                    _ => GooseError::Authentication {
                        message: DEFAULT_LOGIN_ERROR.to_string(),
                    },
                })
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<User> {
        let response = self.api.login(username, password).await?;
        save_token(self.storage.as_ref(), &response.token)?;
        self.api.set_token(Some(response.token)).await;

        let user = self.api.me().await?;
        save_user(self.storage.as_ref(), &user)?;
        Ok(user)
    }

    /// Log out: best-effort server logout, then clear everything local.
    ///
    /// Observers see the transition to `Unauthenticated` and should return to
    /// the login entry point.
    pub async fn logout(&self) {
        if self.api.has_token().await {
            if let Err(e) = self.api.logout().await {
                debug!("server logout failed, clearing local session anyway: {e}");
            }
        }
        self.api.set_token(None).await;
        if let Err(e) = clear_session(self.storage.as_ref()) {
            warn!("failed to clear session storage: {e}");
        }
        self.set_state(SessionState::Unauthenticated);
    }

    /// Force a logout if `err` means the session is no longer valid.
    ///
    /// Returns `true` when a logout happened. Session invalidation is silent:
    /// callers should not surface the error itself.
    pub async fn handle_error(&self, err: &GooseError) -> bool {
        if err.is_session_invalid() && self.is_authenticated() {
            info!("session invalidated by server, logging out");
            self.logout().await;
            return true;
        }
        false
    }

    /// Force a logout if a round watcher stopped because the session was rejected.
    ///
    /// Returns `true` when a logout happened. Embedders should pass every
    /// [`RoundEvent::Stopped`](crate::RoundEvent::Stopped) reason through here.
    pub async fn handle_stop(&self, reason: StopReason) -> bool {
        if reason == StopReason::SessionInvalid {
            return self.handle_error(&GooseError::Unauthorized).await;
        }
        false
    }

    /// Create a new round as the current user.
    ///
    /// # Errors
    ///
    /// [`GooseError::NotAuthenticated`] without a session,
    /// [`GooseError::Forbidden`] for non-privileged users (no request is sent),
    /// or any API error from `POST /rounds`.
    pub async fn create_round(&self) -> Result<PhasedRound> {
        let user = self.current_user().ok_or(GooseError::NotAuthenticated)?;
        if !user.role.can_create_rounds() {
            return Err(GooseError::Forbidden);
        }
        let round = self.api.create_round().await?;
        info!(round_id = %round.id, "round created");
        Ok(PhasedRound::from_round(round))
    }

    // ── State accessors ─────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state_tx.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state_tx.borrow(), SessionState::Authenticated(_))
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// The API handle this session authenticates.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn set_state(&self, state: SessionState) {
        debug!(?state, "session state");
        self.state_tx.send_replace(state);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
