//! Waitlist handlers: the landing-page form and its JSON twin.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};

use crate::api::dto::{JoinWaitlistForm, JoinWaitlistRequest};
use crate::app_state::AppState;
use crate::domain::{EnrollmentOutcome, SubmissionResult};

/// `POST /waitlist` — Landing-page form submission.
#[utoipa::path(
    post,
    path = "/waitlist",
    tag = "Waitlist",
    summary = "Join the waitlist (form)",
    description = "Accepts the URL-encoded landing-page form. Re-submitting an address already on the list is accepted.",
    request_body(content = JoinWaitlistForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Address is on the waitlist", body = SubmissionResult),
        (status = 422, description = "Address failed validation", body = SubmissionResult),
        (status = 503, description = "Waitlist storage unavailable", body = SubmissionResult),
    )
)]
pub async fn join_waitlist_form(
    State(state): State<AppState>,
    Form(form): Form<JoinWaitlistForm>,
) -> (StatusCode, Json<SubmissionResult>) {
    let raw = form.email.unwrap_or_default();
    submission_response(state.waitlist_service.enroll(&raw).await)
}

/// `POST /api/v1/waitlist` — JSON submission.
#[utoipa::path(
    post,
    path = "/api/v1/waitlist",
    tag = "Waitlist",
    summary = "Join the waitlist",
    description = "JSON variant of the form. A non-string `email` is rendered as text and fails validation.",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 200, description = "Address is on the waitlist", body = SubmissionResult),
        (status = 422, description = "Address failed validation", body = SubmissionResult),
        (status = 503, description = "Waitlist storage unavailable", body = SubmissionResult),
    )
)]
pub async fn join_waitlist(
    State(state): State<AppState>,
    Json(req): Json<JoinWaitlistRequest>,
) -> (StatusCode, Json<SubmissionResult>) {
    submission_response(state.waitlist_service.enroll(&req.raw_email()).await)
}

/// Maps an enrollment outcome to its status and body.
pub(crate) fn submission_response(outcome: EnrollmentOutcome) -> (StatusCode, Json<SubmissionResult>) {
    let status = match &outcome {
        EnrollmentOutcome::Joined
        | EnrollmentOutcome::AlreadyEnrolled
        | EnrollmentOutcome::JoinedConcurrently => StatusCode::OK,
        EnrollmentOutcome::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EnrollmentOutcome::LookupFailed | EnrollmentOutcome::InsertFailed => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(SubmissionResult::from(outcome)))
}

/// Form route mounted at the root level.
pub fn form_routes() -> Router<AppState> {
    Router::new().route("/waitlist", post(join_waitlist_form))
}

/// JSON routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/waitlist", post(join_waitlist))
}
