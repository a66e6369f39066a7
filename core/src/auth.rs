//! Sign-in/sign-up operations and derived authentication state.
//!
//! # Design
//! `AuthApi` wraps the two credential endpoints and stores the returned token
//! in the session on success. `AuthSession` is the read side: it derives an
//! `AuthState` snapshot from whatever the store currently holds, without any
//! network traffic. A token that is present but undecodable is treated as
//! corrupt and removed on sight, so one bad write cannot wedge the client in
//! a half-authenticated state.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::session::{Identity, SessionStore};
use crate::types::{AuthResponse, Credentials};

/// Client for the `/api/auth` endpoints.
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `POST /api/auth/signin`. On success the returned token replaces
    /// whatever the session held before.
    pub fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self.client.post("/api/auth/signin", credentials)?;
        self.client.session().set_token(&response.token);
        Ok(response)
    }

    /// `POST /api/auth/signup`. Registers the account and signs it in.
    pub fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self.client.post("/api/auth/signup", credentials)?;
        self.client.session().set_token(&response.token);
        Ok(response)
    }
}

/// Snapshot of the authentication state at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<Identity>,
    pub loading: bool,
}

impl AuthState {
    /// The state before the first [`AuthSession::check_status`] has run.
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: true,
        }
    }

    fn signed_in(user: Identity) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            loading: false,
        }
    }

    fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: false,
        }
    }
}

/// Derives [`AuthState`] from the session store.
#[derive(Clone)]
pub struct AuthSession {
    store: Arc<SessionStore>,
}

impl AuthSession {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Resolve the current state. A stored token whose identity cannot be
    /// decoded is cleared here, so the next check starts from signed-out
    /// instead of retrying the same broken token.
    pub fn check_status(&self) -> AuthState {
        if !self.store.is_authenticated() {
            return AuthState::signed_out();
        }
        match self.store.identity() {
            Some(identity) => AuthState::signed_in(identity),
            None => self.log_out(),
        }
    }

    /// Drop the stored token. Idempotent.
    pub fn log_out(&self) -> AuthState {
        self.store.clear_token();
        AuthState::signed_out()
    }
}
