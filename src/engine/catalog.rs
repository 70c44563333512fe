//! engine::catalog
//!
//! Joins item metadata with live inventory into one addressable catalog.
//!
//! # Merge Rules
//!
//! - Metadata is indexed by raw id; a repeated id keeps the last entry.
//! - One entry is produced per inventory record, in inventory order.
//! - A record with no metadata gets a placeholder type
//!   (`Unknown Item <id>`, key `unknown:<id>`, max count = record stack size).
//!
//! The catalog is recomputed on every fetch and never cached.
//!
//! # Example
//!
//! ```
//! use sorting_operator::core::types::{InventoryRecord, ItemType};
//! use sorting_operator::engine::catalog::merge_catalog;
//!
//! let metadata = vec![ItemType {
//!     raw_id: 1,
//!     key: "minecraft:stone".into(),
//!     max_count: 64,
//!     display_name: "Stone".into(),
//! }];
//! let inventory = vec![InventoryRecord {
//!     item_id: 1,
//!     count: 64,
//!     data_components: None,
//!     stack_size: 64,
//!     stackable_hash: "1".into(),
//!     full_shulker_stackable_hash: None,
//! }];
//!
//! let catalog = merge_catalog(&metadata, &inventory);
//! assert_eq!(catalog[0].display_name, "Stone");
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::api::{ApiError, AutomationApi};
use crate::core::types::{InventoryRecord, ItemType};

/// One stock line: an inventory record joined with its item type.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub item_type: ItemType,
    pub record: InventoryRecord,
    pub display_name: String,
    pub count: u32,
}

impl CatalogEntry {
    /// Stable key of the item type.
    pub fn key(&self) -> &str {
        &self.item_type.key
    }
}

/// Merge metadata and inventory into catalog entries.
pub fn merge_catalog(metadata: &[ItemType], inventory: &[InventoryRecord]) -> Vec<CatalogEntry> {
    let index: HashMap<u32, &ItemType> = metadata.iter().map(|t| (t.raw_id, t)).collect();

    inventory
        .iter()
        .map(|record| {
            let item_type = match index.get(&record.item_id) {
                Some(t) => (*t).clone(),
                None => ItemType::unknown(record.item_id, record.stack_size),
            };
            CatalogEntry {
                display_name: item_type.display_name.clone(),
                count: record.count,
                item_type,
                record: record.clone(),
            }
        })
        .collect()
}

/// Fetch metadata and inventory concurrently and merge them.
///
/// # Errors
///
/// Fails with the first fetch error; no partial catalog is returned.
pub async fn fetch_catalog(api: &dyn AutomationApi) -> Result<Vec<CatalogEntry>, ApiError> {
    let (metadata, inventory) = tokio::try_join!(api.item_metadata(), api.inventory_listing())?;
    debug!(
        item_types = metadata.len(),
        records = inventory.len(),
        "merging catalog"
    );
    Ok(merge_catalog(&metadata, &inventory))
}

/// Sort entries with the most stock first. Ties keep their order.
pub fn sort_by_count_desc(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count));
}

/// Entries whose display name or key contains `query`, ignoring case.
pub fn search<'a>(entries: &'a [CatalogEntry], query: &str) -> Vec<&'a CatalogEntry> {
    let query = query.to_lowercase();
    entries
        .iter()
        .filter(|e| {
            e.display_name.to_lowercase().contains(&query) || e.key().to_lowercase().contains(&query)
        })
        .collect()
}

/// Entry with exactly this item key.
pub fn find_by_key<'a>(entries: &'a [CatalogEntry], key: &str) -> Option<&'a CatalogEntry> {
    entries.iter().find(|e| e.key() == key)
}
