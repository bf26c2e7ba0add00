//! Sign-in handlers: magic-link request, callback, sign-out.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::account::bearer_token;
use crate::api::dto::{MagicLinkResponse, SendMagicLinkRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::identity::CallbackParams;
use crate::service::Navigation;

/// `POST /auth/magic-link` — Email a one-time sign-in link.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a blank address and
/// [`GatewayError::MagicLinkFailed`] if the identity service fails.
#[utoipa::path(
    post,
    path = "/api/v1/auth/magic-link",
    tag = "Auth",
    summary = "Request a magic link",
    description = "Asks the identity service to email a sign-in link that redirects back to the site's callback page.",
    request_body = SendMagicLinkRequest,
    responses(
        (status = 200, description = "Link sent", body = MagicLinkResponse),
        (status = 400, description = "Blank email address", body = ErrorResponse),
        (status = 502, description = "Identity service failed", body = ErrorResponse),
    )
)]
pub async fn request_magic_link(
    State(state): State<AppState>,
    Json(req): Json<SendMagicLinkRequest>,
) -> Result<Json<MagicLinkResponse>, GatewayError> {
    let sent = state.auth_service.request_magic_link(&req.email).await?;
    Ok(Json(sent.into()))
}

/// `POST /auth/callback` — Resolve callback credentials to a navigation.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if the listener stops without
/// navigating.
#[utoipa::path(
    post,
    path = "/api/v1/auth/callback",
    tag = "Auth",
    summary = "Complete sign-in",
    description = "Runs the session listener over the credentials the identity service appended to the callback URL and returns where to send the user.",
    request_body = CallbackParams,
    responses(
        (status = 200, description = "Terminal navigation", body = Navigation),
        (status = 500, description = "Listener failure", body = ErrorResponse),
    )
)]
pub async fn complete_callback(
    State(state): State<AppState>,
    Json(params): Json<CallbackParams>,
) -> Result<Json<Navigation>, GatewayError> {
    let navigation = state.auth_service.complete_callback(params).await?;
    Ok(Json(navigation))
}

/// `POST /auth/signout` — Revoke the caller's session.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signout",
    tag = "Auth",
    summary = "Sign out",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 503, description = "Identity service unavailable", body = ErrorResponse),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let token = bearer_token(&headers)?;
    state.auth_service.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Auth routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/magic-link", post(request_magic_link))
        .route("/auth/callback", post(complete_callback))
        .route("/auth/signout", post(sign_out))
}
