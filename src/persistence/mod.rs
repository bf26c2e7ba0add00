//! Persistence layer: the waitlist table.
//!
//! Provides the [`WaitlistStore`] trait for the two operations the
//! enrollment flow needs. The production implementation uses
//! `sqlx::PgPool`; [`memory::InMemoryWaitlistStore`] backs local runs with
//! persistence disabled and the test suite.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

pub use memory::InMemoryWaitlistStore;
pub use models::WaitlistEntry;
pub use postgres::PostgresWaitlistStore;

use crate::domain::WaitlistEmail;

/// Failure reported by a [`WaitlistStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Another row already holds this email.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint.
        constraint: String,
    },

    /// Transport, pool, or query failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::UniqueViolation`].
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Storage for waitlist rows.
///
/// Implementations must enforce uniqueness of `email` themselves and
/// report a losing insert as [`StoreError::UniqueViolation`].
#[async_trait]
pub trait WaitlistStore: Send + Sync + fmt::Debug {
    /// Looks up the row whose email equals `email` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query cannot be executed.
    async fn find_by_email(
        &self,
        email: &WaitlistEmail,
    ) -> Result<Option<WaitlistEntry>, StoreError>;

    /// Inserts a new row for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if a row already exists and
    /// [`StoreError::Backend`] for any other failure.
    async fn insert(&self, email: &WaitlistEmail) -> Result<WaitlistEntry, StoreError>;
}
