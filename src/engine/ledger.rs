//! engine::ledger
//!
//! Acquires and releases holds on behalf of one orchestration call.
//!
//! # Acquisition Policies
//!
//! - **Strict** ([`HoldLedger::acquire_all`]): any failed filter fails the
//!   whole batch. Holds granted to the other filters are released before
//!   the error is returned, and the first error in request order is reported.
//! - **Tolerant** ([`HoldLedger::acquire_tolerant`]): failed filters are
//!   skipped and whatever was granted is kept.
//!
//! # Release
//!
//! Granted holds come back as a [`HeldBatch`], which can only be consumed
//! by [`HoldLedger::release`]. [`HoldLedger::scoped`] runs a step with the
//! batch's ids and releases afterwards whatever the step returned, so every
//! exit path releases exactly once.
//!
//! Release is best effort: a failed release is logged at `warn` and never
//! turned into an error for the caller. The server expires holds on its own.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, AutomationApi, ReservationFilter};
use crate::core::types::HoldId;

/// Errors from hold acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The hold request itself failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server could not satisfy one of the filters.
    #[error("failed to acquire items: {0}")]
    Unsatisfied(String),

    /// The response did not carry one outcome per filter.
    #[error("hold response answered {answered} of {requested} requests")]
    Incomplete { requested: usize, answered: usize },
}

/// Holds granted in one batch and not yet released.
#[must_use = "held slots must be passed to HoldLedger::release"]
#[derive(Debug)]
pub struct HeldBatch {
    ids: Vec<HoldId>,
    released: bool,
}

impl HeldBatch {
    fn new(ids: Vec<HoldId>) -> Self {
        Self {
            ids,
            released: false,
        }
    }

    pub fn ids(&self) -> &[HoldId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Drop for HeldBatch {
    fn drop(&mut self) {
        if !self.released && !self.ids.is_empty() {
            warn!(
                count = self.ids.len(),
                "held slots dropped without release; they stay reserved until they expire"
            );
        }
    }
}

/// Hold bookkeeping over an [`AutomationApi`].
pub struct HoldLedger<'a> {
    api: &'a dyn AutomationApi,
}

impl<'a> HoldLedger<'a> {
    pub fn new(api: &'a dyn AutomationApi) -> Self {
        Self { api }
    }

    /// Acquire every filter or nothing.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Api`] if the request failed; nothing was granted.
    /// - [`LedgerError::Unsatisfied`] with the first filter error; holds
    ///   granted to the other filters have already been released.
    /// - [`LedgerError::Incomplete`] if the outcomes do not line up with the
    ///   filters; anything granted has already been released.
    pub async fn acquire_all(&self, filters: &[ReservationFilter]) -> Result<HeldBatch, LedgerError> {
        debug!(filters = filters.len(), "requesting holds");
        let result = self.api.create_holds(filters).await?;
        let batch = HeldBatch::new(result.granted_ids());

        if result.results.len() != filters.len() {
            warn!(
                requested = filters.len(),
                answered = result.results.len(),
                "hold response does not match request"
            );
            let error = LedgerError::Incomplete {
                requested: filters.len(),
                answered: result.results.len(),
            };
            self.release(batch).await;
            return Err(error);
        }

        if let Some(message) = result.first_error() {
            debug!(
                failed = result.error_count(),
                granted = batch.len(),
                "hold batch rejected"
            );
            let error = LedgerError::Unsatisfied(message.to_string());
            self.release(batch).await;
            return Err(error);
        }

        debug!(granted = batch.len(), "holds acquired");
        Ok(batch)
    }

    /// Acquire whatever the server grants, skipping failed filters.
    pub async fn acquire_tolerant(
        &self,
        filters: &[ReservationFilter],
    ) -> Result<HeldBatch, ApiError> {
        debug!(filters = filters.len(), "requesting holds");
        let result = self.api.create_holds(filters).await?;
        let batch = HeldBatch::new(result.granted_ids());

        if result.results.len() != filters.len() {
            warn!(
                requested = filters.len(),
                answered = result.results.len(),
                "hold response does not match request; using what was granted"
            );
        }

        debug!(
            granted = batch.len(),
            skipped = result.error_count(),
            "holds acquired"
        );
        Ok(batch)
    }

    /// Release a batch. Returns whether the server acknowledged it.
    ///
    /// An empty batch makes no request.
    pub async fn release(&self, mut batch: HeldBatch) -> bool {
        batch.released = true;
        let ids = std::mem::take(&mut batch.ids);
        if ids.is_empty() {
            return true;
        }

        match self.api.release_holds(&ids).await {
            Ok(()) => {
                debug!(count = ids.len(), "holds released");
                true
            }
            Err(e) => {
                warn!(count = ids.len(), error = %e, "failed to release holds");
                false
            }
        }
    }

    /// Run `step` with the batch's ids, then release the batch.
    ///
    /// The release happens whether `step` succeeds or fails, and its own
    /// outcome never replaces the step's result.
    pub async fn scoped<T, E, F, Fut>(&self, batch: HeldBatch, step: F) -> Result<T, E>
    where
        F: FnOnce(Vec<HoldId>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let result = step(batch.ids().to_vec()).await;
        self.release(batch).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{FailOn, MockAutomation, MockOperation};

    #[tokio::test]
    async fn strict_success_keeps_all_holds() {
        let api = MockAutomation::new().grant("stone", 2).grant("dirt", 1);
        let ledger = HoldLedger::new(&api);

        let batch = ledger
            .acquire_all(&[
                ReservationFilter::item_match("stone", 128),
                ReservationFilter::item_match("dirt", 10),
            ])
            .await
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(api.outstanding_holds().len(), 3);

        assert!(ledger.release(batch).await);
        assert!(api.outstanding_holds().is_empty());
    }

    #[tokio::test]
    async fn strict_failure_releases_granted_and_reports_first_error() {
        let api = MockAutomation::new()
            .grant("stone", 2)
            .reject("dirt", "not enough dirt")
            .reject("sand", "not enough sand");
        let ledger = HoldLedger::new(&api);

        let err = ledger
            .acquire_all(&[
                ReservationFilter::item_match("stone", 128),
                ReservationFilter::item_match("dirt", 10),
                ReservationFilter::item_match("sand", 10),
            ])
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::Unsatisfied("not enough dirt".into()));
        assert!(api.outstanding_holds().is_empty());
        assert_eq!(api.released_holds().len(), 2);
    }

    #[tokio::test]
    async fn strict_failure_with_nothing_granted_makes_no_release() {
        let api = MockAutomation::new().reject("dirt", "none");
        let ledger = HoldLedger::new(&api);

        let result = ledger
            .acquire_all(&[ReservationFilter::item_match("dirt", 1)])
            .await;
        assert!(result.is_err());
        assert!(!api
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::ReleaseHolds { .. })));
    }

    /// Serves every call from the inner mock but drops hold outcomes
    /// beyond the first `keep`.
    struct ShortAnswers {
        inner: MockAutomation,
        keep: usize,
    }

    #[async_trait::async_trait]
    impl AutomationApi for ShortAnswers {
        async fn item_metadata(&self) -> Result<Vec<crate::core::types::ItemType>, ApiError> {
            self.inner.item_metadata().await
        }

        async fn inventory_listing(
            &self,
        ) -> Result<Vec<crate::core::types::InventoryRecord>, ApiError> {
            self.inner.inventory_listing().await
        }

        async fn sign_config(&self) -> Result<crate::core::types::SignConfig, ApiError> {
            self.inner.sign_config().await
        }

        async fn create_holds(
            &self,
            requests: &[ReservationFilter],
        ) -> Result<crate::api::HoldBatchResult, ApiError> {
            let mut result = self.inner.create_holds(requests).await?;
            result.results.truncate(self.keep);
            Ok(result)
        }

        async fn release_holds(&self, ids: &[HoldId]) -> Result<(), ApiError> {
            self.inner.release_holds(ids).await
        }

        async fn execute_operation(
            &self,
            operation: &crate::api::PhysicalOperation,
            priority: crate::api::Priority,
        ) -> Result<(), ApiError> {
            self.inner.execute_operation(operation, priority).await
        }

        async fn stats(&self) -> Result<crate::core::types::Stats, ApiError> {
            self.inner.stats().await
        }
    }

    #[tokio::test]
    async fn strict_rejects_short_response() {
        let api = ShortAnswers {
            inner: MockAutomation::new().grant("stone", 2),
            keep: 1,
        };
        let ledger = HoldLedger::new(&api);

        let err = ledger
            .acquire_all(&[
                ReservationFilter::item_match("stone", 128),
                ReservationFilter::item_match("dirt", 10),
            ])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::Incomplete {
                requested: 2,
                answered: 1
            }
        );
        // Holds behind the dropped outcome are unknown to the client; the
        // ones it saw are released.
        assert_eq!(api.inner.released_holds().len(), 2);
    }

    #[tokio::test]
    async fn strict_rejects_empty_response() {
        let api = ShortAnswers {
            inner: MockAutomation::new(),
            keep: 0,
        };
        let ledger = HoldLedger::new(&api);

        let err = ledger
            .acquire_all(&[ReservationFilter::item_match("stone", 1)])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Incomplete {
                requested: 1,
                answered: 0
            }
        );
    }

    #[tokio::test]
    async fn tolerant_skips_failures() {
        let api = MockAutomation::new().with_empty_slots(3);
        let ledger = HoldLedger::new(&api);

        let batch = ledger
            .acquire_tolerant(&vec![ReservationFilter::EmptySlot; 5])
            .await
            .unwrap();
        assert_eq!(batch.len(), 3);
        ledger.release(batch).await;
    }

    #[tokio::test]
    async fn request_failure_propagates() {
        let api = MockAutomation::new().fail_on(FailOn::CreateHolds(ApiError::Rejected {
            status: 503,
            body: "busy".into(),
        }));
        let ledger = HoldLedger::new(&api);

        let err = ledger
            .acquire_all(&[ReservationFilter::EmptySlot])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error (status 503): busy");
    }

    #[tokio::test]
    async fn release_failure_is_not_escalated() {
        let api = MockAutomation::new();
        let ledger = HoldLedger::new(&api);
        let batch = ledger
            .acquire_all(&[ReservationFilter::EmptySlot])
            .await
            .unwrap();

        api.clone()
            .fail_on(FailOn::ReleaseHolds(ApiError::Transport("reset".into())));
        assert!(!ledger.release(batch).await);
    }

    #[tokio::test]
    async fn scoped_releases_after_failing_step() {
        let api = MockAutomation::new().grant("stone", 2);
        let ledger = HoldLedger::new(&api);
        let batch = ledger
            .acquire_all(&[ReservationFilter::item_match("stone", 128)])
            .await
            .unwrap();

        let result: Result<(), &str> = ledger
            .scoped(batch, |ids| async move {
                assert_eq!(ids.len(), 2);
                Err("step failed")
            })
            .await;

        assert_eq!(result, Err("step failed"));
        assert!(api.outstanding_holds().is_empty());
    }
}
