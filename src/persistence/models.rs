//! Database models for waitlist rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored row from the `waitlist_entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitlistEntry {
    /// Row ID assigned at insert time.
    pub id: Uuid,
    /// Normalized email address (unique).
    pub email: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<(Uuid, String, DateTime<Utc>)> for WaitlistEntry {
    fn from((id, email, created_at): (Uuid, String, DateTime<Utc>)) -> Self {
        Self {
            id,
            email,
            created_at,
        }
    }
}
