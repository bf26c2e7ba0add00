//! Waitlist submission outcomes and the result returned to the form.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Terminal outcome of one enrollment attempt.
///
/// Every path through the enrollment flow ends in exactly one variant;
/// [`SubmissionResult::from`] turns it into the user-facing payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// A new row was written.
    Joined,
    /// The existence check found a row.
    AlreadyEnrolled,
    /// The insert lost a race against a concurrent submission.
    JoinedConcurrently,
    /// The address failed validation; storage was not contacted.
    Invalid {
        /// Field-level message for the `email` input.
        field_error: String,
    },
    /// The existence check failed.
    LookupFailed,
    /// The insert failed for a reason other than a uniqueness conflict.
    InsertFailed,
}

impl EnrollmentOutcome {
    /// Whether the submission counts as accepted from the user's view.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(
            self,
            Self::Joined | Self::AlreadyEnrolled | Self::JoinedConcurrently
        )
    }

    /// User-facing message for this outcome.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Joined => "Successfully joined the waitlist! We'll notify you when we launch.",
            Self::AlreadyEnrolled => "This email is already on the waitlist!",
            Self::JoinedConcurrently => "This email is already on the waitlist.",
            Self::Invalid { .. } => "Please enter a valid email address.",
            Self::LookupFailed => "Server error. Please try again later.",
            Self::InsertFailed => "Could not add to waitlist. Please try again.",
        }
    }
}

/// Result of a waitlist form submission. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubmissionResult {
    /// Whether the email is (now) on the waitlist.
    pub accepted: bool,
    /// Message to show the user.
    pub message: String,
    /// Validation messages keyed by form field name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl From<EnrollmentOutcome> for SubmissionResult {
    fn from(outcome: EnrollmentOutcome) -> Self {
        let accepted = outcome.is_accepted();
        let message = outcome.message().to_string();
        let mut field_errors = BTreeMap::new();
        if let EnrollmentOutcome::Invalid { field_error } = outcome {
            field_errors.insert("email".to_string(), vec![field_error]);
        }
        Self {
            accepted,
            message,
            field_errors,
        }
    }
}
