//! # connectpro-gateway
//!
//! Backend for the ConnectPro pre-launch site: waitlist enrollment and
//! passwordless (magic-link) sign-in.
//!
//! Waitlist submissions are normalized and validated, checked against the
//! store, and inserted at most once per address; the store's uniqueness
//! constraint is the final arbiter under concurrency. Sign-in delegates to a
//! hosted identity service; after a link is opened, a session listener
//! waits for the session to appear and navigates exactly once.
//!
//! ## Architecture
//!
//! ```text
//! Clients (landing form, JSON, callback page)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── WaitlistService ─── AuthService ─── SessionListener (service/)
//!     │                            │
//!     ├── WaitlistEmail, SubmissionResult, Session, EventBus (domain/)
//!     │                            │
//!     ├── WaitlistStore            ├── AuthSession (identity/)
//!     │   ├── PostgreSQL           └── GoTrue HTTP client
//!     │   └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod service;
