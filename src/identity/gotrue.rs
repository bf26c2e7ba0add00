//! Reqwest-backed client for a GoTrue-compatible auth API.
//!
//! This adapter owns transport details only: endpoint resolution, the
//! `apikey`/bearer headers, status mapping, and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use url::Url;

use super::{IdentityApi, IdentityError, MagicLinkRequest};
use crate::config::IdentityConfig;
use crate::domain::SessionUser;

const OTP_PATH: &str = "auth/v1/otp";
const USER_PATH: &str = "auth/v1/user";
const LOGOUT_PATH: &str = "auth/v1/logout";

#[derive(Debug, Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    create_user: bool,
}

/// HTTP client for the hosted identity service.
///
/// `Debug` omits the API key.
#[derive(Clone)]
pub struct GoTrueClient {
    http: Client,
    base_url: Url,
    anon_key: String,
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GoTrueClient {
    /// Builds a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Transport`] if the reqwest client cannot be
    /// constructed.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(Self::with_client(http, config.url.clone(), config.anon_key.clone()))
    }

    /// Builds a client around an existing reqwest [`Client`].
    #[must_use]
    pub fn with_client(http: Client, mut base_url: Url, anon_key: String) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::InvalidResponse(format!("bad endpoint {path}: {e}")))
    }

    fn authorized(&self, builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder.header("apikey", &self.anon_key).bearer_auth(bearer)
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, IdentityError> {
    builder
        .send()
        .await
        .map_err(|e| IdentityError::Transport(e.to_string()))
}

/// Extracts a human-readable message from a GoTrue error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

async fn rejected(response: Response) -> IdentityError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    IdentityError::Rejected {
        status,
        message: error_message(&body),
    }
}

#[async_trait]
impl IdentityApi for GoTrueClient {
    async fn send_magic_link(&self, request: &MagicLinkRequest) -> Result<(), IdentityError> {
        let mut url = self.endpoint(OTP_PATH)?;
        url.query_pairs_mut()
            .append_pair("redirect_to", request.redirect_to.as_str());

        let builder = self.http.post(url).json(&OtpBody {
            email: &request.email,
            create_user: request.create_user,
        });
        let response = send(self.authorized(builder, &self.anon_key)).await?;

        if response.status().is_success() {
            tracing::debug!(redirect_to = %request.redirect_to, "magic link requested");
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser, IdentityError> {
        let builder = self.http.get(self.endpoint(USER_PATH)?);
        let response = send(self.authorized(builder, access_token)).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::Unauthorized),
            status if status.is_success() => response
                .json::<SessionUser>()
                .await
                .map_err(|e| IdentityError::InvalidResponse(e.to_string())),
            _ => Err(rejected(response).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let builder = self.http.post(self.endpoint(LOGOUT_PATH)?);
        let response = send(self.authorized(builder, access_token)).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::Unauthorized),
            status if status.is_success() => Ok(()),
            _ => Err(rejected(response).await),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> GoTrueClient {
        let Ok(base) = Url::parse(&server.uri()) else {
            panic!("mock server uri");
        };
        GoTrueClient::with_client(Client::new(), base, "anon-key".to_string())
    }

    fn link_request() -> MagicLinkRequest {
        let Ok(redirect_to) = Url::parse("https://connectpro.app/auth/callback") else {
            panic!("valid url");
        };
        MagicLinkRequest {
            email: "user@example.com".to_string(),
            redirect_to,
            create_user: true,
        }
    }

    #[tokio::test]
    async fn magic_link_posts_otp_with_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/otp"))
            .and(query_param(
                "redirect_to",
                "https://connectpro.app/auth/callback",
            ))
            .and(header("apikey", "anon-key"))
            .and(body_json(serde_json::json!({
                "email": "user@example.com",
                "create_user": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server).send_magic_link(&link_request()).await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn magic_link_rejection_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/otp"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"code": 429, "msg": "too many requests"})),
            )
            .mount(&server)
            .await;

        let result = client(&server).send_magic_link(&link_request()).await;
        assert_eq!(
            result,
            Err(IdentityError::Rejected {
                status: 429,
                message: "too many requests".to_string()
            })
        );
    }

    #[tokio::test]
    async fn get_user_decodes_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u-1",
                "email": "user@example.com",
                "aud": "authenticated"
            })))
            .mount(&server)
            .await;

        let Ok(user) = client(&server).get_user("token-1").await else {
            panic!("expected user");
        };
        assert_eq!(user.id, "u-1");
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn get_user_maps_401_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server).get_user("expired").await;
        assert_eq!(result, Err(IdentityError::Unauthorized));
    }

    #[tokio::test]
    async fn sign_out_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server).sign_out("token-1").await, Ok(()));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let Ok(base) = Url::parse("http://127.0.0.1:9") else {
            panic!("valid url");
        };
        let client = GoTrueClient::with_client(Client::new(), base, "anon-key".to_string());
        let result = client.get_user("token").await;
        assert!(matches!(result, Err(IdentityError::Transport(_))));
    }

    #[test]
    fn base_path_is_preserved() {
        let Ok(base) = Url::parse("https://gateway.example/identity") else {
            panic!("valid url");
        };
        let client = GoTrueClient::with_client(Client::new(), base, String::new());
        let Ok(url) = client.endpoint(USER_PATH) else {
            panic!("endpoint");
        };
        assert_eq!(url.as_str(), "https://gateway.example/identity/auth/v1/user");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("{\"error_description\":\"bad\"}"), "bad");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
