//! Per-flow session state on top of the identity service.
//!
//! An [`AuthSession`] plays the role of the browser-side auth client: it
//! holds at most one [`Session`], turns callback credentials into a session
//! by verifying them with the identity service, and broadcasts every
//! lifecycle change through an [`EventBus`]. State changes and their
//! events are published under the same write guard, so a subscriber never
//! misses a change that happened after its `INITIAL_SESSION` snapshot.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::{IdentityApi, IdentityError, SessionSource, SessionSubscription};
use crate::domain::{EventBus, Session, SessionEvent};

/// Lifetime assumed when the callback carries neither `expires_at` nor
/// `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3_600;

/// Credentials the identity service appends to the callback URL.
///
/// Either the token fields or `error`/`error_description` are present.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct CallbackParams {
    /// Bearer token for the new session.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Refresh token for the new session.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp at which `access_token` expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Token type, normally `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Error code when the link was invalid or expired.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable error detail.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Debug for CallbackParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackParams")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("error", &self.error)
            .field("error_description", &self.error_description)
            .finish_non_exhaustive()
    }
}

impl CallbackParams {
    /// Out-of-range lifetimes fall back to [`DEFAULT_EXPIRES_IN_SECS`].
    fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let after = |secs: i64| TimeDelta::try_seconds(secs).and_then(|d| now.checked_add_signed(d));
        self.expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.and_then(after))
            .or_else(|| after(DEFAULT_EXPIRES_IN_SECS))
            .unwrap_or(now)
    }
}

/// Session state for one sign-in flow.
#[derive(Debug)]
pub struct AuthSession {
    identity: Arc<dyn IdentityApi>,
    current: RwLock<Option<Session>>,
    events: EventBus,
}

impl AuthSession {
    /// Creates an empty session bound to `identity`.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityApi>, event_capacity: usize) -> Self {
        Self {
            identity,
            current: RwLock::new(None),
            events: EventBus::new(event_capacity),
        }
    }

    /// Turns callback credentials into an established session.
    ///
    /// On success the session is stored and `SIGNED_IN` is published. On any
    /// failure the session is cleared and `SIGNED_OUT` is published.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::CallbackRejected`] if the redirect carried
    /// an error or no token, and the verification error otherwise.
    pub async fn complete_callback(&self, params: CallbackParams) -> Result<Session, IdentityError> {
        match self.verify(&params).await {
            Ok(session) => {
                let mut current = self.current.write().await;
                *current = Some(session.clone());
                self.events.publish(SessionEvent::signed_in(session.clone()));
                drop(current);
                tracing::info!(user_id = %session.user.id, "session established");
                Ok(session)
            }
            Err(err) => {
                tracing::warn!(error = %err, "callback did not establish a session");
                self.clear().await;
                Err(err)
            }
        }
    }

    async fn verify(&self, params: &CallbackParams) -> Result<Session, IdentityError> {
        if let Some(code) = &params.error {
            let detail = params.error_description.as_deref().unwrap_or(code);
            return Err(IdentityError::CallbackRejected(detail.to_string()));
        }
        let access_token = params
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| IdentityError::CallbackRejected("missing access_token".to_string()))?;

        let user = self.identity.get_user(access_token).await?;
        Ok(Session {
            access_token: access_token.to_string(),
            refresh_token: params.refresh_token.clone().unwrap_or_default(),
            expires_at: params.expiry(Utc::now()),
            user,
        })
    }

    /// Revokes the current session (best effort) and clears it.
    pub async fn sign_out(&self) {
        let token = self
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone());
        if let Some(token) = token
            && let Err(err) = self.identity.sign_out(&token).await
        {
            tracing::warn!(error = %err, "token revocation failed");
        }
        self.clear().await;
    }

    async fn clear(&self) {
        let mut current = self.current.write().await;
        *current = None;
        self.events.publish(SessionEvent::signed_out());
    }
}

#[async_trait]
impl SessionSource for AuthSession {
    async fn subscribe(&self) -> SessionSubscription {
        let current = self.current.read().await;
        let receiver = self.events.subscribe();
        SessionSubscription::new(Some(SessionEvent::initial(current.clone())), receiver)
    }

    async fn current_session(&self) -> Option<Session> {
        let mut current = self.current.write().await;
        if current.as_ref().is_some_and(|s| s.is_expired_at(Utc::now())) {
            *current = None;
            self.events.publish(SessionEvent::signed_out());
            tracing::debug!("dropped expired session");
        }
        current.clone()
    }
}
