//! Identity layer: the hosted auth service and per-flow session state.
//!
//! [`IdentityApi`] is the seam to the external identity service (magic-link
//! delivery, token verification, revocation). [`SessionSource`] is what the
//! session listener observes: a subscription to lifecycle events plus a
//! direct session query. [`AuthSession`] implements it on top of an
//! [`IdentityApi`].

pub mod auth_session;
pub mod gotrue;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

pub use auth_session::{AuthSession, CallbackParams};
pub use gotrue::GoTrueClient;

use crate::domain::{Session, SessionEvent, SessionUser};

/// Failure talking to the identity service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The request never produced an HTTP response.
    #[error("identity transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("identity service rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The access token is missing, invalid, or expired.
    #[error("access token rejected")]
    Unauthorized,

    /// The redirect carried an error instead of credentials.
    #[error("callback rejected: {0}")]
    CallbackRejected(String),

    /// A success response could not be decoded.
    #[error("invalid identity response: {0}")]
    InvalidResponse(String),
}

/// Parameters for a one-time sign-in link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkRequest {
    /// Recipient address.
    pub email: String,
    /// Where the service redirects the browser after the link is opened.
    pub redirect_to: Url,
    /// Create the user if no account exists for `email`.
    pub create_user: bool,
}

/// Operations the gateway needs from the identity service.
#[async_trait]
pub trait IdentityApi: Send + Sync + fmt::Debug {
    /// Asks the service to email a one-time sign-in link.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the service cannot be reached or
    /// refuses the request.
    async fn send_magic_link(&self, request: &MagicLinkRequest) -> Result<(), IdentityError>;

    /// Resolves an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Unauthorized`] for invalid or expired tokens.
    async fn get_user(&self, access_token: &str) -> Result<SessionUser, IdentityError>;

    /// Revokes the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if revocation fails.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

/// Source of session lifecycle notifications.
#[async_trait]
pub trait SessionSource: Send + Sync + fmt::Debug {
    /// Registers for notifications. The first event delivered is
    /// `INITIAL_SESSION` carrying the session current at subscription time.
    async fn subscribe(&self) -> SessionSubscription;

    /// Returns the current session, if one is established and unexpired.
    async fn current_session(&self) -> Option<Session>;
}

/// A registration for session events.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct SessionSubscription {
    initial: Option<SessionEvent>,
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Creates a subscription that yields `initial` before anything
    /// received on `receiver`.
    #[must_use]
    pub const fn new(
        initial: Option<SessionEvent>,
        receiver: broadcast::Receiver<SessionEvent>,
    ) -> Self {
        Self { initial, receiver }
    }

    /// Waits for the next event. Returns `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "session subscriber lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Unregisters from the event source.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
