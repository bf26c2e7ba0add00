//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! JSON endpoints are mounted under `/api/v1`. The landing-page form posts
//! to `/waitlist` and the health check lives at `/health`.

pub mod doc;
pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::waitlist::form_routes())
        .merge(handlers::system::routes())
}
