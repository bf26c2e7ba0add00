//! REST endpoint handlers organized by resource.

pub mod account;
pub mod auth;
pub mod system;
pub mod waitlist;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(waitlist::routes())
        .merge(auth::routes())
        .merge(account::routes())
}
