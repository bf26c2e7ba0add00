//! Bearer-authenticated account endpoints.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::waitlist::submission_response;
use crate::api::dto::CurrentUserResponse;
use crate::app_state::AppState;
use crate::domain::{SubmissionResult, WaitlistEmail};
use crate::error::{ErrorResponse, GatewayError};

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] if the header is absent or not a
/// bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GatewayError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(GatewayError::Unauthorized)
}

/// `GET /me` — Signed-in account and its waitlist membership.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid bearer token and
/// [`GatewayError::StoreUnavailable`] if the membership lookup fails.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Account",
    summary = "Current account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account summary", body = CurrentUserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 503, description = "Collaborator unavailable", body = ErrorResponse),
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CurrentUserResponse>, GatewayError> {
    let token = bearer_token(&headers)?;
    let user = state.auth_service.current_user(token).await?;

    let on_waitlist = match user.email.as_deref().map(WaitlistEmail::parse) {
        Some(Ok(email)) => state.waitlist_service.is_enrolled(&email).await?,
        _ => false,
    };

    Ok(Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        on_waitlist,
    }))
}

/// `POST /me/waitlist` — Enroll the signed-in account's own email.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid bearer token and
/// [`GatewayError::MissingAccountEmail`] if the account has no email.
#[utoipa::path(
    post,
    path = "/api/v1/me/waitlist",
    tag = "Account",
    summary = "Join the waitlist as the signed-in user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Address is on the waitlist", body = SubmissionResult),
        (status = 400, description = "Account has no email", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Account email failed validation", body = SubmissionResult),
        (status = 503, description = "Waitlist storage unavailable", body = SubmissionResult),
    )
)]
pub async fn join_waitlist_as_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SubmissionResult>), GatewayError> {
    let token = bearer_token(&headers)?;
    let user = state.auth_service.current_user(token).await?;
    let email = user.email.ok_or(GatewayError::MissingAccountEmail)?;
    Ok(submission_response(state.waitlist_service.enroll(&email).await))
}

/// Account routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(current_user))
        .route("/me/waitlist", post(join_waitlist_as_user))
}
