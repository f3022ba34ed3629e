//! Session lifecycle: an explicit, injectable object rather than an ambient
//! global. Holds the current user and token, and owns every transition
//! between `Loading`, `Authenticated` and `Anonymous`.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::constants::PROFILE_NOT_FOUND_CODE;
use crate::core::errors::{LibraryError, LibraryResult};
use crate::core::models::User;
use crate::infrastructure::api::{LibraryApi, LoginRequest, RegisterRequest};
use crate::infrastructure::token::TokenStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Startup state; consumers must not render role-gated content yet.
    Loading,
    Authenticated(User),
    Anonymous,
}

/// Instruction to send the user to the login screen with an operator-facing
/// explanation, produced when the account's profile record is gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRedirect {
    pub code: String,
    pub message: String,
}

pub struct Session<A: LibraryApi, T: TokenStore> {
    api: Arc<A>,
    tokens: T,
    state: RwLock<SessionState>,
    token: RwLock<Option<String>>,
}

impl<A: LibraryApi, T: TokenStore> Session<A, T> {
    pub fn new(api: Arc<A>, tokens: T) -> Self {
        Session {
            api,
            tokens,
            state: RwLock::new(SessionState::Loading),
            token: RwLock::new(None),
        }
    }

    /// Resolves the persisted token, if any, into a session state.
    ///
    /// A missing-profile error forces a logout and returns the redirect the
    /// shell should follow; any other profile failure clears the token and
    /// lands in `Anonymous` silently.
    pub async fn initialize(&self) -> LibraryResult<Option<SessionRedirect>> {
        let persisted = self.tokens.load().await?;
        let Some(token) = persisted else {
            self.set_state(SessionState::Anonymous, None).await;
            return Ok(None);
        };

        match self.api.profile(&token).await {
            Ok(user) => {
                info!(user_id = %user.id, "session restored");
                self.set_state(SessionState::Authenticated(user), Some(token)).await;
                Ok(None)
            }
            Err(LibraryError::ProfileMissing) => {
                self.tokens.clear().await?;
                self.set_state(SessionState::Anonymous, None).await;
                Ok(Some(SessionRedirect {
                    code: PROFILE_NOT_FOUND_CODE.to_string(),
                    message: LibraryError::ProfileMissing.to_string(),
                }))
            }
            Err(e) => {
                warn!(error = %e, "stored token could not be resolved");
                self.tokens.clear().await?;
                self.set_state(SessionState::Anonymous, None).await;
                Ok(None)
            }
        }
    }

    /// Exchanges credentials for a token, persists it, then fetches the
    /// authoritative profile. A profile-fetch failure falls back to the
    /// partial user from the login response rather than failing the login.
    pub async fn login(&self, email: &str, password: &str) -> LibraryResult<User> {
        let response = self
            .api
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.tokens.save(&response.token).await?;

        let user = match self.api.profile(&response.token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "profile fetch after login failed, using login payload");
                response.user.ok_or(e)?
            }
        };

        info!(user_id = %user.id, "logged in");
        self.set_state(SessionState::Authenticated(user.clone()), Some(response.token))
            .await;
        Ok(user)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> LibraryResult<User> {
        let response = self
            .api
            .register(RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.tokens.save(&response.token).await?;

        let user = match self.api.profile(&response.token).await {
            Ok(user) => user,
            Err(e) => response.user.ok_or(e)?,
        };

        info!(user_id = %user.id, "registered");
        self.set_state(SessionState::Authenticated(user.clone()), Some(response.token))
            .await;
        Ok(user)
    }

    /// Clears the persisted token and resets to `Anonymous`. No network call.
    pub async fn logout(&self) {
        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "could not clear persisted token");
        }
        self.set_state(SessionState::Anonymous, None).await;
        info!("logged out");
    }

    async fn set_state(&self, state: SessionState, token: Option<String>) {
        *self.state.write().await = state;
        *self.token.write().await = token;
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        *self.state.read().await == SessionState::Loading
    }

    pub async fn current_user(&self) -> Option<User> {
        match &*self.state.read().await {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}
