//! api::traits
//!
//! The `AutomationApi` trait: everything the client needs from the server.
//!
//! # Design
//!
//! The trait is async because every method is a network round trip. It is
//! the single seam between the reservation engine and the transport, so the
//! engine can be exercised against [`MockAutomation`] without a server.
//!
//! Implementations perform exactly one request per call. There is no retry
//! at this layer or above it.
//!
//! [`MockAutomation`]: crate::api::mock::MockAutomation

use async_trait::async_trait;
use thiserror::Error;

use super::wire::{HoldBatchResult, PhysicalOperation, Priority, ReservationFilter};
use crate::core::types::{HoldId, InventoryRecord, ItemType, SignConfig, Stats};

/// Errors from automation server requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection, timeout, or request-body marshal failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with an HTTP error status.
    #[error("API error (status {status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded (e.g. "item metadata")
        what: &'static str,
        message: String,
    },
}

impl ApiError {
    /// HTTP status if the server rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client side of the automation server's HTTP API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the catalog merge runs two
/// requests concurrently against the same instance.
#[async_trait]
pub trait AutomationApi: Send + Sync {
    /// `GET /data/items`
    async fn item_metadata(&self) -> Result<Vec<ItemType>, ApiError>;

    /// `GET /automation/inventory_listing`
    async fn inventory_listing(&self) -> Result<Vec<InventoryRecord>, ApiError>;

    /// `GET /automation/sign_config`
    async fn sign_config(&self) -> Result<SignConfig, ApiError>;

    /// `POST /automation/holds`
    ///
    /// The server allocates each filter atomically and answers with one
    /// outcome per filter, in request order.
    async fn create_holds(
        &self,
        requests: &[ReservationFilter],
    ) -> Result<HoldBatchResult, ApiError>;

    /// `DELETE /automation/holds`
    async fn release_holds(&self, ids: &[HoldId]) -> Result<(), ApiError>;

    /// `POST /automation/operations`
    ///
    /// Fire-and-acknowledge: success means the server queued the operation.
    async fn execute_operation(
        &self,
        operation: &PhysicalOperation,
        priority: Priority,
    ) -> Result<(), ApiError>;

    /// `GET /admin/stats`
    async fn stats(&self) -> Result<Stats, ApiError>;
}
