//! Waitlist request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// URL-encoded body of the landing-page form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct JoinWaitlistForm {
    /// Raw form value. A missing field is treated as empty.
    #[serde(default)]
    pub email: Option<String>,
}

/// JSON body of `POST /api/v1/waitlist`.
///
/// `email` is accepted as any JSON value so that non-strings reach
/// validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct JoinWaitlistRequest {
    /// Address to enroll.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub email: Option<serde_json::Value>,
}

impl JoinWaitlistRequest {
    /// The submitted value as text: `null` and absent become empty,
    /// strings pass through, anything else uses its JSON rendering.
    #[must_use]
    pub fn raw_email(&self) -> String {
        match &self.email {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Signed-in account summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    /// Identity service user id.
    pub id: String,
    /// Account email, if the identity service has one.
    pub email: Option<String>,
    /// Whether the account's email is on the waitlist.
    pub on_waitlist: bool,
}
