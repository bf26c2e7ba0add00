//! Waitlist service: validates submissions and writes them once.

use std::sync::Arc;

use crate::domain::{EnrollmentOutcome, WaitlistEmail};
use crate::error::GatewayError;
use crate::persistence::WaitlistStore;

/// Orchestrates waitlist enrollment.
///
/// Every submission runs normalize → validate → existence check → insert,
/// strictly in that order. The store's uniqueness constraint decides
/// duplicates; the existence check only saves a doomed insert.
#[derive(Debug, Clone)]
pub struct WaitlistService {
    store: Arc<dyn WaitlistStore>,
}

impl WaitlistService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn WaitlistStore>) -> Self {
        Self { store }
    }

    /// Runs the full enrollment flow for a raw form value.
    ///
    /// Never fails: every error is folded into an [`EnrollmentOutcome`].
    pub async fn enroll(&self, raw_email: &str) -> EnrollmentOutcome {
        let email = match WaitlistEmail::parse(raw_email) {
            Ok(email) => email,
            Err(err) => {
                tracing::debug!(error = %err, "waitlist submission failed validation");
                return EnrollmentOutcome::Invalid {
                    field_error: err.field_message().to_string(),
                };
            }
        };

        match self.store.find_by_email(&email).await {
            Ok(Some(_)) => {
                tracing::debug!(%email, "email already on waitlist");
                EnrollmentOutcome::AlreadyEnrolled
            }
            Ok(None) => self.insert_if_absent(&email).await,
            Err(err) => {
                tracing::error!(%email, error = %err, "waitlist existence check failed");
                EnrollmentOutcome::LookupFailed
            }
        }
    }

    /// Inserts `email` without a prior existence check.
    ///
    /// A uniqueness conflict is reported as
    /// [`EnrollmentOutcome::JoinedConcurrently`], never as a failure.
    pub async fn insert_if_absent(&self, email: &WaitlistEmail) -> EnrollmentOutcome {
        match self.store.insert(email).await {
            Ok(entry) => {
                tracing::info!(%email, entry_id = %entry.id, "joined waitlist");
                EnrollmentOutcome::Joined
            }
            Err(err) if err.is_unique_violation() => {
                tracing::info!(%email, "concurrent waitlist insert resolved as duplicate");
                EnrollmentOutcome::JoinedConcurrently
            }
            Err(err) => {
                tracing::error!(%email, error = %err, "waitlist insert failed");
                EnrollmentOutcome::InsertFailed
            }
        }
    }

    /// Returns whether `email` is on the waitlist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the lookup fails.
    pub async fn is_enrolled(&self, email: &WaitlistEmail) -> Result<bool, GatewayError> {
        self.store
            .find_by_email(email)
            .await
            .map(|row| row.is_some())
            .map_err(|err| {
                tracing::error!(%email, error = %err, "waitlist membership lookup failed");
                GatewayError::StoreUnavailable
            })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::persistence::{InMemoryWaitlistStore, StoreError, WaitlistEntry};

    /// Store whose lookups always miss, so every caller reaches the insert.
    #[derive(Debug, Default)]
    struct StaleLookupStore {
        inner: InMemoryWaitlistStore,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl WaitlistStore for StaleLookupStore {
        async fn find_by_email(
            &self,
            _email: &WaitlistEmail,
        ) -> Result<Option<WaitlistEntry>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(None)
        }

        async fn insert(&self, email: &WaitlistEmail) -> Result<WaitlistEntry, StoreError> {
            self.inner.insert(email).await
        }
    }

    /// Store that fails the configured operations.
    #[derive(Debug, Default)]
    struct FailingStore {
        fail_lookup: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WaitlistStore for FailingStore {
        async fn find_by_email(
            &self,
            _email: &WaitlistEmail,
        ) -> Result<Option<WaitlistEntry>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookup {
                Err(StoreError::Backend("connection reset".to_string()))
            } else {
                Ok(None)
            }
        }

        async fn insert(&self, _email: &WaitlistEmail) -> Result<WaitlistEntry, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    fn service_with_memory() -> (WaitlistService, Arc<InMemoryWaitlistStore>) {
        let store = Arc::new(InMemoryWaitlistStore::new());
        let service = WaitlistService::new(Arc::clone(&store) as Arc<dyn WaitlistStore>);
        (service, store)
    }

    #[tokio::test]
    async fn malformed_input_never_touches_storage() {
        let store = Arc::new(FailingStore::default());
        let service = WaitlistService::new(Arc::clone(&store) as Arc<dyn WaitlistStore>);

        for raw in ["", "   ", "no-at-sign", "user@", "user@nodomain"] {
            let outcome = service.enroll(raw).await;
            assert!(
                matches!(outcome, EnrollmentOutcome::Invalid { .. }),
                "{raw:?} should be invalid"
            );
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn new_email_is_stored_once_normalized() {
        let (service, store) = service_with_memory();

        let outcome = service.enroll("  USER@Example.com ").await;
        assert_eq!(outcome, EnrollmentOutcome::Joined);
        assert_eq!(store.len().await, 1);

        let Ok(email) = WaitlistEmail::parse("user@example.com") else {
            panic!("valid email");
        };
        assert!(matches!(service.is_enrolled(&email).await, Ok(true)));
    }

    #[tokio::test]
    async fn resubmission_is_idempotent() {
        let (service, store) = service_with_memory();

        assert_eq!(service.enroll("a@example.com").await, EnrollmentOutcome::Joined);
        let second = service.enroll("A@EXAMPLE.COM").await;
        assert_eq!(second, EnrollmentOutcome::AlreadyEnrolled);
        assert!(second.is_accepted());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_store_one_row_and_all_accept() {
        let store = Arc::new(StaleLookupStore::default());
        let service = WaitlistService::new(Arc::clone(&store) as Arc<dyn WaitlistStore>);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let service = service.clone();
            tasks.spawn(async move { service.enroll("race@example.com").await });
        }

        let mut joined = 0;
        let mut conflicted = 0;
        while let Some(result) = tasks.join_next().await {
            let Ok(outcome) = result else {
                panic!("task panicked");
            };
            assert!(outcome.is_accepted(), "unexpected outcome {outcome:?}");
            match outcome {
                EnrollmentOutcome::Joined => joined += 1,
                EnrollmentOutcome::JoinedConcurrently => conflicted += 1,
                _ => {}
            }
        }
        assert_eq!(joined, 1);
        assert_eq!(conflicted, 15);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 16);
        assert_eq!(store.inner.len().await, 1);
    }

    #[tokio::test]
    async fn lookup_failure_is_generic_and_skips_insert() {
        let store = Arc::new(FailingStore {
            fail_lookup: true,
            ..FailingStore::default()
        });
        let service = WaitlistService::new(Arc::clone(&store) as Arc<dyn WaitlistStore>);

        let outcome = service.enroll("a@example.com").await;
        assert_eq!(outcome, EnrollmentOutcome::LookupFailed);
        assert_eq!(outcome.message(), "Server error. Please try again later.");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn insert_failure_is_not_accepted() {
        let service = WaitlistService::new(Arc::new(FailingStore::default()));
        let outcome = service.enroll("a@example.com").await;
        assert_eq!(outcome, EnrollmentOutcome::InsertFailed);
        assert!(!outcome.message().contains("disk full"));
    }

    #[tokio::test]
    async fn membership_lookup_failure_maps_to_store_unavailable() {
        let service = WaitlistService::new(Arc::new(FailingStore {
            fail_lookup: true,
            ..FailingStore::default()
        }));
        let Ok(email) = WaitlistEmail::parse("a@example.com") else {
            panic!("valid email");
        };
        assert!(matches!(
            service.is_enrolled(&email).await,
            Err(GatewayError::StoreUnavailable)
        ));
    }
}
