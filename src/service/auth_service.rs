//! Auth service: magic-link requests, callback handling, and bearer checks.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::session_listener::{
    CHECK_EMAIL_ROUTE, ChannelNavigator, Navigation, Navigator, SessionListener,
};
use crate::domain::SessionUser;
use crate::error::GatewayError;
use crate::identity::{
    AuthSession, CallbackParams, IdentityApi, IdentityError, MagicLinkRequest, SessionSource,
};

/// Confirmation returned after a magic link was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkSent {
    /// Message for the user.
    pub message: &'static str,
    /// Waiting page to show next.
    pub redirect_to: &'static str,
}

/// Orchestrates the magic-link flow against the identity service.
#[derive(Debug, Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityApi>,
    callback_url: Url,
    callback_timeout: Duration,
    event_capacity: usize,
}

impl AuthService {
    /// Creates a service that sends links redirecting to `callback_url`.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityApi>,
        callback_url: Url,
        callback_timeout: Duration,
        event_capacity: usize,
    ) -> Self {
        Self {
            identity,
            callback_url,
            callback_timeout,
            event_capacity,
        }
    }

    /// Asks the identity service to email a sign-in link to `raw_email`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank address (no
    /// request is made) and [`GatewayError::MagicLinkFailed`] if the
    /// identity service fails. There is no automatic retry.
    pub async fn request_magic_link(&self, raw_email: &str) -> Result<MagicLinkSent, GatewayError> {
        let email = raw_email.trim();
        if email.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Please enter your email address.".to_string(),
            ));
        }

        let request = MagicLinkRequest {
            email: email.to_string(),
            redirect_to: self.callback_url.clone(),
            create_user: true,
        };
        self.identity
            .send_magic_link(&request)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "magic link request failed");
                GatewayError::MagicLinkFailed
            })?;

        tracing::info!(redirect_to = %self.callback_url, "magic link sent");
        Ok(MagicLinkSent {
            message: "We've sent you a magic link to sign in.",
            redirect_to: CHECK_EMAIL_ROUTE,
        })
    }

    /// Runs a session listener over the credentials from the callback
    /// redirect and returns its single navigation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the listener stops without
    /// navigating.
    pub async fn complete_callback(&self, params: CallbackParams) -> Result<Navigation, GatewayError> {
        let session = Arc::new(AuthSession::new(
            Arc::clone(&self.identity),
            self.event_capacity,
        ));
        let (navigator, navigation) = ChannelNavigator::new();
        let listener = SessionListener::mount(
            Arc::clone(&session) as Arc<dyn SessionSource>,
            Arc::new(navigator) as Arc<dyn Navigator>,
            self.callback_timeout,
        )
        .await;

        let exchange = tokio::spawn(async move {
            // Outcome reaches the listener as SIGNED_IN or SIGNED_OUT.
            let _ = session.complete_callback(params).await;
        });

        let result = navigation.await;
        exchange.abort();
        listener.unmount();

        result.map_err(|_| GatewayError::Internal("session listener stopped without navigating".to_string()))
    }

    /// Resolves a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] for rejected tokens and
    /// [`GatewayError::IdentityUnavailable`] if the service fails.
    pub async fn current_user(&self, access_token: &str) -> Result<SessionUser, GatewayError> {
        self.identity
            .get_user(access_token)
            .await
            .map_err(map_identity_error)
    }

    /// Revokes the session behind a bearer token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::current_user`].
    pub async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        self.identity
            .sign_out(access_token)
            .await
            .map_err(map_identity_error)?;
        tracing::info!("session revoked");
        Ok(())
    }
}

fn map_identity_error(err: IdentityError) -> GatewayError {
    match err {
        IdentityError::Unauthorized => GatewayError::Unauthorized,
        other => {
            tracing::error!(error = %other, "identity service call failed");
            GatewayError::IdentityUnavailable
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::identity::auth_session::tests::FakeIdentity;
    use crate::service::session_listener::{DASHBOARD_ROUTE, ListenerState, SIGN_IN_ROUTE};

    /// Identity whose token verification never completes.
    #[derive(Debug, Default)]
    struct StalledIdentity;

    #[async_trait]
    impl IdentityApi for StalledIdentity {
        async fn send_magic_link(&self, _request: &MagicLinkRequest) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn get_user(&self, _access_token: &str) -> Result<SessionUser, IdentityError> {
            std::future::pending().await
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    fn callback_url() -> Url {
        let Ok(url) = Url::parse("https://connectpro.app/auth/callback") else {
            panic!("valid url");
        };
        url
    }

    fn service(identity: Arc<FakeIdentity>, timeout: Duration) -> AuthService {
        AuthService::new(
            identity as Arc<dyn IdentityApi>,
            callback_url(),
            timeout,
            8,
        )
    }

    #[tokio::test]
    async fn blank_email_is_rejected_before_any_request() {
        let identity = Arc::new(FakeIdentity::accepting("good"));
        let svc = service(Arc::clone(&identity), Duration::from_secs(7));

        let result = svc.request_magic_link("   ").await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
        let sent = identity.links.lock().map(|l| l.len()).unwrap_or_default();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn link_request_uses_callback_url_and_creates_users() {
        let identity = Arc::new(FakeIdentity::accepting("good"));
        let svc = service(Arc::clone(&identity), Duration::from_secs(7));

        let Ok(sent) = svc.request_magic_link(" user@example.com ").await else {
            panic!("link should be sent");
        };
        assert_eq!(sent.redirect_to, CHECK_EMAIL_ROUTE);

        let links = identity.links.lock().map(|l| l.clone()).unwrap_or_default();
        let Some(link) = links.first() else {
            panic!("expected one link request");
        };
        assert_eq!(link.email, "user@example.com");
        assert_eq!(link.redirect_to, callback_url());
        assert!(link.create_user);
    }

    #[tokio::test]
    async fn identity_failure_is_generic() {
        let identity = Arc::new(FakeIdentity {
            fail_links: true,
            ..FakeIdentity::default()
        });
        let svc = service(identity, Duration::from_secs(7));

        let result = svc.request_magic_link("user@example.com").await;
        assert!(matches!(result, Err(GatewayError::MagicLinkFailed)));
    }

    #[tokio::test]
    async fn valid_callback_leads_to_dashboard() {
        let svc = service(Arc::new(FakeIdentity::accepting("good")), Duration::from_secs(7));
        let Ok(nav) = svc
            .complete_callback(CallbackParams {
                access_token: Some("good".to_string()),
                ..CallbackParams::default()
            })
            .await
        else {
            panic!("callback should navigate");
        };
        assert_eq!(nav.state, ListenerState::Established);
        assert_eq!(nav.route, DASHBOARD_ROUTE);
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let svc = service(Arc::new(FakeIdentity::accepting("good")), Duration::from_secs(7));
        let Ok(nav) = svc
            .complete_callback(CallbackParams {
                access_token: Some("forged".to_string()),
                ..CallbackParams::default()
            })
            .await
        else {
            panic!("callback should navigate");
        };
        assert_eq!(nav.state, ListenerState::Rejected);
        assert_eq!(nav.route, SIGN_IN_ROUTE);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_verification_times_out_and_releases_the_exchange() {
        let identity = Arc::new(StalledIdentity);
        let svc = AuthService::new(
            Arc::clone(&identity) as Arc<dyn IdentityApi>,
            callback_url(),
            Duration::from_secs(7),
            8,
        );

        let started = tokio::time::Instant::now();
        let Ok(nav) = svc
            .complete_callback(CallbackParams {
                access_token: Some("good".to_string()),
                ..CallbackParams::default()
            })
            .await
        else {
            panic!("callback should navigate");
        };
        assert_eq!(nav.state, ListenerState::TimedOut);
        assert_eq!(nav.route, SIGN_IN_ROUTE);
        assert!(started.elapsed() >= Duration::from_secs(7));

        // Aborted exchange and listener tasks drop their identity handles.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(Arc::strong_count(&identity), 2);
    }

    #[tokio::test]
    async fn unknown_token_maps_to_unauthorized() {
        let svc = service(Arc::new(FakeIdentity::accepting("good")), Duration::from_secs(7));
        assert!(matches!(
            svc.current_user("nope").await,
            Err(GatewayError::Unauthorized)
        ));
        let Ok(user) = svc.current_user("good").await else {
            panic!("known token");
        };
        assert_eq!(user.id, "user-1");
    }
}
