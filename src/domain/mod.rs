//! Domain layer: email identity, submission outcomes, and sessions.
//!
//! This module contains the server-side domain model: the normalized
//! waitlist address, the result of a form submission, identity sessions
//! with their lifecycle events, and the event bus that carries them.

pub mod email;
pub mod event_bus;
pub mod session;
pub mod submission;

pub use email::{EmailError, WaitlistEmail};
pub use event_bus::EventBus;
pub use session::{AuthChangeEvent, Session, SessionEvent, SessionUser};
pub use submission::{EnrollmentOutcome, SubmissionResult};
