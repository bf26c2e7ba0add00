//! Magic-link and callback bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::MagicLinkSent;

/// Body of `POST /api/v1/auth/magic-link`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SendMagicLinkRequest {
    /// Address to send the link to.
    #[serde(default)]
    pub email: String,
}

/// Confirmation that a link was sent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MagicLinkResponse {
    /// Message for the user.
    pub message: String,
    /// Page to show while the user checks their inbox.
    pub redirect_to: String,
}

impl From<MagicLinkSent> for MagicLinkResponse {
    fn from(sent: MagicLinkSent) -> Self {
        Self {
            message: sent.message.to_string(),
            redirect_to: sent.redirect_to.to_string(),
        }
    }
}
