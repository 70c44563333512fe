//! api::mock
//!
//! Mock automation server for deterministic testing.
//!
//! # Design
//!
//! `MockAutomation` keeps catalog, site configuration and stats in memory,
//! grants holds according to a small script, and records every call so tests
//! can assert on exactly what was requested, submitted and released.
//!
//! Hold granting rules:
//! - `EmptySlot` filters are granted one hold each, until the configured
//!   number of free slots runs out (unlimited by default).
//! - `ItemMatch` filters grant the number of holds configured for their hash
//!   (one by default), or fail with the configured error message.
//!
//! # Example
//!
//! ```
//! use sorting_operator::api::mock::MockAutomation;
//! use sorting_operator::api::{AutomationApi, ReservationFilter};
//!
//! # tokio_test::block_on(async {
//! let api = MockAutomation::new().grant("stone", 3);
//!
//! let result = api
//!     .create_holds(&[ReservationFilter::item_match("stone", 192)])
//!     .await
//!     .unwrap();
//! assert_eq!(result.granted_ids().len(), 3);
//!
//! api.release_holds(&result.granted_ids()).await.unwrap();
//! assert!(api.outstanding_holds().is_empty());
//! # });
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::traits::{ApiError, AutomationApi};
use super::wire::{HoldBatchResult, HoldOutcome, PhysicalOperation, Priority, ReservationFilter};
use crate::core::types::{
    Dimension, Expiry, Hold, HoldId, InventoryRecord, ItemType, Location, SignConfig, Stats,
    Vec3,
};

/// Error message used when a filter cannot be satisfied.
pub const NO_MATCH: &str = "No match was found for the requested criteria";

/// Mock automation server for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockAutomation {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug)]
struct MockInner {
    items: Vec<ItemType>,
    inventory: Vec<InventoryRecord>,
    sign_config: SignConfig,
    stats: Stats,
    /// Holds granted per item-match hash (default 1).
    grants: HashMap<String, usize>,
    /// Item-match hashes that fail, with their error message.
    rejections: HashMap<String, String>,
    /// Remaining empty slots; `None` means unlimited.
    empty_slots: Option<usize>,
    next_hold: u64,
    granted: BTreeSet<HoldId>,
    released: Vec<HoldId>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    ItemMetadata(ApiError),
    InventoryListing(ApiError),
    SignConfig(ApiError),
    CreateHolds(ApiError),
    ReleaseHolds(ApiError),
    ExecuteOperation(ApiError),
    Stats(ApiError),
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    ItemMetadata,
    InventoryListing,
    SignConfig,
    CreateHolds {
        requests: Vec<ReservationFilter>,
    },
    ReleaseHolds {
        ids: Vec<HoldId>,
    },
    ExecuteOperation {
        operation: PhysicalOperation,
        priority: Priority,
    },
    Stats,
}

impl MockAutomation {
    /// Create an empty mock server.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                items: Vec::new(),
                inventory: Vec::new(),
                sign_config: SignConfig::default(),
                stats: Stats::default(),
                grants: HashMap::new(),
                rejections: HashMap::new(),
                empty_slots: None,
                next_hold: 1,
                granted: BTreeSet::new(),
                released: Vec::new(),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap()
    }

    /// Serve this item metadata from `/data/items`.
    pub fn with_items(self, items: Vec<ItemType>) -> Self {
        self.lock().items = items;
        self
    }

    /// Serve this inventory from `/automation/inventory_listing`.
    pub fn with_inventory(self, inventory: Vec<InventoryRecord>) -> Self {
        self.lock().inventory = inventory;
        self
    }

    /// Serve this site configuration from `/automation/sign_config`.
    pub fn with_sign_config(self, sign_config: SignConfig) -> Self {
        self.lock().sign_config = sign_config;
        self
    }

    /// Serve these counters from `/admin/stats`.
    pub fn with_stats(self, stats: Stats) -> Self {
        self.lock().stats = stats;
        self
    }

    /// Grant `count` holds to item-match filters on `stackable_hash`.
    pub fn grant(self, stackable_hash: impl Into<String>, count: usize) -> Self {
        self.lock().grants.insert(stackable_hash.into(), count);
        self
    }

    /// Fail item-match filters on `stackable_hash` with `message`.
    pub fn reject(self, stackable_hash: impl Into<String>, message: impl Into<String>) -> Self {
        self.lock()
            .rejections
            .insert(stackable_hash.into(), message.into());
        self
    }

    /// Limit how many empty-slot filters can be granted.
    pub fn with_empty_slots(self, count: usize) -> Self {
        self.lock().empty_slots = Some(count);
        self
    }

    /// Configure the mock to fail a specific call.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded calls.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Filters sent across every `create_holds` call, in order.
    pub fn hold_requests(&self) -> Vec<Vec<ReservationFilter>> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                MockOperation::CreateHolds { requests } => Some(requests.clone()),
                _ => None,
            })
            .collect()
    }

    /// Operations submitted via `execute_operation`, in order.
    pub fn submitted(&self) -> Vec<(PhysicalOperation, Priority)> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                MockOperation::ExecuteOperation {
                    operation,
                    priority,
                } => Some((operation.clone(), *priority)),
                _ => None,
            })
            .collect()
    }

    /// Every hold id granted so far.
    pub fn granted_holds(&self) -> BTreeSet<HoldId> {
        self.lock().granted.clone()
    }

    /// Every hold id successfully released, in release order (duplicates kept).
    pub fn released_holds(&self) -> Vec<HoldId> {
        self.lock().released.clone()
    }

    /// Granted holds that have not been released.
    pub fn outstanding_holds(&self) -> BTreeSet<HoldId> {
        let inner = self.lock();
        let released: BTreeSet<&HoldId> = inner.released.iter().collect();
        inner
            .granted
            .iter()
            .filter(|id| !released.contains(id))
            .cloned()
            .collect()
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), ApiError> {
        let inner = self.lock();
        let error = match &inner.fail_on {
            Some(FailOn::ItemMetadata(e)) if expected == "item_metadata" => e,
            Some(FailOn::InventoryListing(e)) if expected == "inventory_listing" => e,
            Some(FailOn::SignConfig(e)) if expected == "sign_config" => e,
            Some(FailOn::CreateHolds(e)) if expected == "create_holds" => e,
            Some(FailOn::ReleaseHolds(e)) if expected == "release_holds" => e,
            Some(FailOn::ExecuteOperation(e)) if expected == "execute_operation" => e,
            Some(FailOn::Stats(e)) if expected == "stats" => e,
            _ => return Ok(()),
        };
        Err(error.clone())
    }
}

impl Default for MockAutomation {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInner {
    fn issue_holds(&mut self, count: usize) -> Vec<Hold> {
        (0..count)
            .map(|_| {
                let n = self.next_hold;
                self.next_hold += 1;
                let hold = Hold {
                    id: HoldId::new(format!("hold-{}", n)),
                    location: Location {
                        vec3: Vec3 {
                            x: n as i32,
                            y: 0,
                            z: 0,
                        },
                        dim: Dimension::Overworld,
                    },
                    slot: (n % 27) as u32,
                    valid_until: Expiry::At(
                        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
                            .single()
                            .unwrap_or_default(),
                    ),
                };
                self.granted.insert(hold.id.clone());
                hold
            })
            .collect()
    }

    fn outcome(&mut self, filter: &ReservationFilter) -> HoldOutcome {
        match filter {
            ReservationFilter::EmptySlot => match self.empty_slots {
                Some(0) => HoldOutcome::Error(NO_MATCH.into()),
                remaining => {
                    self.empty_slots = remaining.map(|n| n - 1);
                    HoldOutcome::Holds {
                        holds: self.issue_holds(1),
                    }
                }
            },
            ReservationFilter::ItemMatch { .. } => {
                let hash = filter.stackable_hash().unwrap_or_default().to_string();
                if let Some(message) = self.rejections.get(&hash) {
                    return HoldOutcome::Error(message.clone());
                }
                let count = self.grants.get(&hash).copied().unwrap_or(1);
                if count == 0 {
                    return HoldOutcome::Error(NO_MATCH.into());
                }
                HoldOutcome::Holds {
                    holds: self.issue_holds(count),
                }
            }
        }
    }
}

#[async_trait]
impl AutomationApi for MockAutomation {
    async fn item_metadata(&self) -> Result<Vec<ItemType>, ApiError> {
        self.record(MockOperation::ItemMetadata);
        self.check_fail("item_metadata")?;
        Ok(self.lock().items.clone())
    }

    async fn inventory_listing(&self) -> Result<Vec<InventoryRecord>, ApiError> {
        self.record(MockOperation::InventoryListing);
        self.check_fail("inventory_listing")?;
        Ok(self.lock().inventory.clone())
    }

    async fn sign_config(&self) -> Result<SignConfig, ApiError> {
        self.record(MockOperation::SignConfig);
        self.check_fail("sign_config")?;
        Ok(self.lock().sign_config.clone())
    }

    async fn create_holds(
        &self,
        requests: &[ReservationFilter],
    ) -> Result<HoldBatchResult, ApiError> {
        self.record(MockOperation::CreateHolds {
            requests: requests.to_vec(),
        });
        self.check_fail("create_holds")?;

        let mut inner = self.lock();
        let results = requests.iter().map(|f| inner.outcome(f)).collect();
        Ok(HoldBatchResult { results })
    }

    async fn release_holds(&self, ids: &[HoldId]) -> Result<(), ApiError> {
        self.record(MockOperation::ReleaseHolds { ids: ids.to_vec() });
        self.check_fail("release_holds")?;
        self.lock().released.extend(ids.iter().cloned());
        Ok(())
    }

    async fn execute_operation(
        &self,
        operation: &PhysicalOperation,
        priority: Priority,
    ) -> Result<(), ApiError> {
        self.record(MockOperation::ExecuteOperation {
            operation: operation.clone(),
            priority,
        });
        self.check_fail("execute_operation")
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        self.record(MockOperation::Stats);
        self.check_fail("stats")?;
        Ok(self.lock().stats.clone())
    }
}
