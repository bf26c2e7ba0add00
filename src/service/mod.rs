//! Service layer: business logic orchestration.
//!
//! [`WaitlistService`] runs the enrollment flow against the waitlist store.
//! [`AuthService`] drives the magic-link flow, mounting a
//! [`SessionListener`] for each callback.

pub mod auth_service;
pub mod session_listener;
pub mod waitlist_service;

pub use auth_service::{AuthService, MagicLinkSent};
pub use session_listener::{ListenerState, Navigation, Navigator, SessionListener};
pub use waitlist_service::WaitlistService;
