//! Identity sessions and their lifecycle events.
//!
//! A [`Session`] is issued and owned by the identity service; this crate
//! only holds a copy and observes its lifecycle through [`SessionEvent`]s.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Identity-service user ID.
    pub id: String,
    /// Email the magic link was sent to. Absent for phone-only users.
    #[serde(default)]
    pub email: Option<String>,
}

/// Credentials for an established session.
///
/// `Debug` redacts both tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for identity and storage requests.
    pub access_token: String,
    /// Token used to mint a new access token.
    pub refresh_token: String,
    /// Instant after which the access token is no longer valid.
    pub expires_at: DateTime<Utc>,
    /// The signed-in user.
    pub user: SessionUser,
}

impl Session {
    /// Returns `true` once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Named lifecycle event kinds fired by the identity client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// Delivered once to each new subscriber with the current session.
    InitialSession,
    /// A session was established.
    SignedIn,
    /// The session was cleared, rejected, or expired.
    SignedOut,
}

impl AuthChangeEvent {
    /// Returns the event name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}

impl fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle notification: the event kind plus the session after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// Which transition happened.
    pub kind: AuthChangeEvent,
    /// Session in effect after the transition, if any.
    pub session: Option<Session>,
}

impl SessionEvent {
    /// Builds an `INITIAL_SESSION` event.
    #[must_use]
    pub const fn initial(session: Option<Session>) -> Self {
        Self {
            kind: AuthChangeEvent::InitialSession,
            session,
        }
    }

    /// Builds a `SIGNED_IN` event.
    #[must_use]
    pub const fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthChangeEvent::SignedIn,
            session: Some(session),
        }
    }

    /// Builds a `SIGNED_OUT` event.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            kind: AuthChangeEvent::SignedOut,
            session: None,
        }
    }

    /// Returns `true` if the event carries a session.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session.is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_tokens() {
        let rendered = format!("{:?}", fixtures::session());
        assert!(!rendered.contains("access-token"));
        assert!(!rendered.contains("refresh-token"));
        assert!(rendered.contains("user@example.com"));
    }

    #[test]
    fn expiry_is_inclusive() {
        let session = fixtures::session();
        assert!(!session.is_expired_at(Utc::now()));
        assert!(session.is_expired_at(session.expires_at));
    }

    #[test]
    fn event_names_match_identity_service() {
        assert_eq!(AuthChangeEvent::SignedIn.to_string(), "SIGNED_IN");
        assert_eq!(AuthChangeEvent::InitialSession.as_str(), "INITIAL_SESSION");
        let json = serde_json::to_string(&AuthChangeEvent::SignedOut).unwrap_or_default();
        assert_eq!(json, "\"SIGNED_OUT\"");
    }

    #[test]
    fn signed_out_has_no_session() {
        assert!(!SessionEvent::signed_out().has_session());
        assert!(SessionEvent::signed_in(fixtures::session()).has_session());
    }
}
