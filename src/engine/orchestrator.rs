//! engine::orchestrator
//!
//! Delivery and pickup: resolve the destination, reserve slots, submit the
//! physical operation, release the slots.
//!
//! # Delivery
//!
//! ```text
//! resolve node -> build filters -> acquire (strict) -> check <= 27 -> DropItems -> release
//! ```
//!
//! # Pickup
//!
//! ```text
//! resolve node -> 27 empty slots -> acquire (tolerant) -> ImportInventory -> release
//! ```
//!
//! Each call performs exactly one acquire/submit/release cycle. Site
//! configuration is fetched fresh for every call. Once holds are granted,
//! every exit path releases them before returning.

use thiserror::Error;
use tracing::{debug, info};

use super::filters::{
    build_delivery_filters, build_pickup_filters, DeliveryIntent, SLOTS_PER_CONTAINER,
};
use super::ledger::{HoldLedger, LedgerError};
use crate::api::{ApiError, AutomationApi, PhysicalOperation, Priority};
use crate::core::types::{Node, Vec3};

/// Errors from delivery and pickup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("destination location '{0}' does not exist")]
    UnknownDestination(String),

    #[error("destination '{0}' does not have a drop-off location")]
    NoDropoffAtDestination(String),

    #[error("destination '{0}' does not have a pickup chest")]
    NoPickupAtDestination(String),

    /// A hold filter could not be satisfied.
    #[error("failed to acquire items: {0}")]
    InsufficientStock(String),

    /// More source slots than one drop operation can carry.
    #[error("too many slots to deliver: {granted} held, at most {limit} per delivery")]
    TooManySlots { granted: usize, limit: usize },

    #[error("nothing to deliver: every item quantity is zero")]
    EmptyDelivery,

    /// The hold response did not answer every filter.
    #[error("hold response answered {answered} of {requested} requests")]
    IncompleteHoldResponse { requested: usize, answered: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<LedgerError> for OperationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Api(e) => OperationError::Api(e),
            LedgerError::Unsatisfied(message) => OperationError::InsufficientStock(message),
            LedgerError::Incomplete {
                requested,
                answered,
            } => OperationError::IncompleteHoldResponse {
                requested,
                answered,
            },
        }
    }
}

/// Outcome of a submitted delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub destination: String,
    /// Source slots handed to the drop operation
    pub slots: usize,
    pub aim_towards: Vec3,
}

/// Outcome of a submitted pickup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupReport {
    pub destination: String,
    /// Destination slots granted (at most 27)
    pub granted: usize,
    pub chest_location: Vec3,
}

async fn resolve_node(api: &dyn AutomationApi, name: &str) -> Result<Node, OperationError> {
    let config = api.sign_config().await?;
    config
        .node(name)
        .cloned()
        .ok_or_else(|| OperationError::UnknownDestination(name.to_string()))
}

/// Deliver the intent's items to its destination's drop-off.
///
/// # Errors
///
/// Fails on the first problem; any holds granted by this call are released
/// before the error is returned.
pub async fn deliver(
    api: &dyn AutomationApi,
    intent: &DeliveryIntent,
    priority: Priority,
) -> Result<DeliveryReport, OperationError> {
    let node = resolve_node(api, &intent.destination).await?;
    let aim_towards = node
        .dropoff
        .ok_or_else(|| OperationError::NoDropoffAtDestination(intent.destination.clone()))?;

    let filters = build_delivery_filters(&intent.items);
    if filters.is_empty() {
        return Err(OperationError::EmptyDelivery);
    }

    let ledger = HoldLedger::new(api);
    let batch = ledger.acquire_all(&filters).await?;

    let slots = batch.len();
    if slots > SLOTS_PER_CONTAINER {
        ledger.release(batch).await;
        return Err(OperationError::TooManySlots {
            granted: slots,
            limit: SLOTS_PER_CONTAINER,
        });
    }

    debug!(destination = %intent.destination, slots, "submitting drop");
    ledger
        .scoped(batch, |source_holds| async move {
            let operation = PhysicalOperation::DropItems {
                source_holds,
                drop_from: node.location,
                aim_towards,
            };
            api.execute_operation(&operation, priority).await
        })
        .await?;

    info!(destination = %intent.destination, slots, "delivery submitted");
    Ok(DeliveryReport {
        destination: intent.destination.clone(),
        slots,
        aim_towards,
    })
}

/// Import the destination's pickup chest into free storage slots.
///
/// Empty-slot filters the server cannot satisfy are skipped; the operation
/// is submitted with whatever was granted.
pub async fn pickup(
    api: &dyn AutomationApi,
    destination: &str,
    priority: Priority,
) -> Result<PickupReport, OperationError> {
    let node = resolve_node(api, destination).await?;
    let chest_location = node
        .pickup
        .ok_or_else(|| OperationError::NoPickupAtDestination(destination.to_string()))?;

    let ledger = HoldLedger::new(api);
    let batch = ledger.acquire_tolerant(&build_pickup_filters()).await?;
    let granted = batch.len();

    debug!(destination, granted, "submitting import");
    ledger
        .scoped(batch, |destination_holds| async move {
            let operation = PhysicalOperation::ImportInventory {
                chest_location,
                node_location: node.location,
                destination_holds,
            };
            api.execute_operation(&operation, priority).await
        })
        .await?;

    info!(destination, granted, "pickup submitted");
    Ok(PickupReport {
        destination: destination.to_string(),
        granted,
        chest_location,
    })
}
