//! In-process waitlist store.
//!
//! Holds rows in a `HashMap` keyed by email behind a single
//! [`tokio::sync::RwLock`]. Uniqueness is checked and the row written under
//! the same write guard, so it behaves like the table's unique constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::WaitlistEntry;
use super::{StoreError, WaitlistStore};
use crate::domain::WaitlistEmail;

/// Name reported in [`StoreError::UniqueViolation`], matching the migration.
const EMAIL_CONSTRAINT: &str = "waitlist_entries_email_key";

/// Waitlist store kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryWaitlistStore {
    rows: RwLock<HashMap<String, WaitlistEntry>>,
}

impl InMemoryWaitlistStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns `true` if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl WaitlistStore for InMemoryWaitlistStore {
    async fn find_by_email(
        &self,
        email: &WaitlistEmail,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(email.as_str()).cloned())
    }

    async fn insert(&self, email: &WaitlistEmail) -> Result<WaitlistEntry, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(email.as_str()) {
            return Err(StoreError::UniqueViolation {
                constraint: EMAIL_CONSTRAINT.to_string(),
            });
        }
        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            email: email.as_str().to_string(),
            created_at: Utc::now(),
        };
        rows.insert(entry.email.clone(), entry.clone());
        Ok(entry)
    }
}
