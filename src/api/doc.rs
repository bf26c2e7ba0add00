//! OpenAPI documentation for the REST API.
//!
//! Registers every handler path and the bearer scheme used by the account
//! and sign-out endpoints. Served by Swagger UI when the `swagger-ui`
//! feature is enabled.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{CurrentUserResponse, JoinWaitlistForm, JoinWaitlistRequest};
use crate::api::dto::{MagicLinkResponse, SendMagicLinkRequest};
use crate::api::handlers::system::HealthResponse;
use crate::domain::SubmissionResult;
use crate::error::{ErrorBody, ErrorResponse};
use crate::identity::CallbackParams;
use crate::service::session_listener::{ListenerState, Navigation, Notice};

/// Adds the identity-service bearer token scheme.
struct BearerAddon;

impl Modify for BearerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Access token issued by the identity service."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the gateway.
#[derive(Debug, OpenApi)]
#[openapi(
    modifiers(&BearerAddon),
    info(
        title = "ConnectPro gateway API",
        description = "Waitlist enrollment and magic-link sign-in for the ConnectPro landing site.",
    ),
    paths(
        crate::api::handlers::system::health_handler,
        crate::api::handlers::waitlist::join_waitlist_form,
        crate::api::handlers::waitlist::join_waitlist,
        crate::api::handlers::auth::request_magic_link,
        crate::api::handlers::auth::complete_callback,
        crate::api::handlers::auth::sign_out,
        crate::api::handlers::account::current_user,
        crate::api::handlers::account::join_waitlist_as_user,
    ),
    components(schemas(
        HealthResponse,
        JoinWaitlistForm,
        JoinWaitlistRequest,
        SubmissionResult,
        SendMagicLinkRequest,
        MagicLinkResponse,
        CallbackParams,
        Navigation,
        Notice,
        ListenerState,
        CurrentUserResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Waitlist", description = "Pre-launch waitlist enrollment"),
        (name = "Auth", description = "Passwordless sign-in"),
        (name = "Account", description = "Signed-in account operations"),
    )
)]
pub struct ApiDoc;
