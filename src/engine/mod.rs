//! engine
//!
//! The reservation and orchestration core.
//!
//! # Architecture
//!
//! ```text
//! api (transport) -> catalog, ledger -> filters -> orchestrator
//! ```
//!
//! - [`catalog`]: merges item metadata with live inventory
//! - [`filters`]: turns delivery and pickup intents into hold filters
//! - [`ledger`]: acquires holds and guarantees their release
//! - [`orchestrator`]: sequences delivery and pickup
//!
//! # Invariants
//!
//! - Every hold id in a submitted operation was granted in the same call
//! - Every hold granted during a call is released exactly once
//! - A delivery never references more than one container's worth of slots
//! - Nothing is retried; the server decides every conflict

pub mod catalog;
pub mod filters;
pub mod ledger;
pub mod orchestrator;

pub use catalog::{fetch_catalog, merge_catalog, CatalogEntry};
pub use filters::{
    build_delivery_filters, build_pickup_filters, DeliveryIntent, DeliveryItem,
    SLOTS_PER_CONTAINER,
};
pub use ledger::{HeldBatch, HoldLedger, LedgerError};
pub use orchestrator::{deliver, pickup, DeliveryReport, OperationError, PickupReport};

use std::path::PathBuf;

use crate::core::config::{Config, ConfigError};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
    /// Server base URL override.
    pub base_url: Option<String>,
    /// API key override.
    pub api_key: Option<String>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// Load configuration with environment and flag overrides applied.
    pub fn config(&self) -> Result<Config, ConfigError> {
        Config::load(self.config_path.as_deref())?
            .with_env(|key| std::env::var(key).ok())?
            .with_flags(self.base_url.clone(), self.api_key.clone())
    }
}
