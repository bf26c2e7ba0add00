//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{AuthService, WaitlistService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Waitlist enrollment.
    pub waitlist_service: Arc<WaitlistService>,
    /// Magic-link sign-in and bearer verification.
    pub auth_service: Arc<AuthService>,
    /// Name of the waitlist backend, reported by `/health`.
    pub store_backend: &'static str,
}
