//! engine::filters
//!
//! Translates delivery and pickup intents into hold filters.
//!
//! # Quantity Rules
//!
//! For each delivery item:
//! - `item_count > 0` requests `item_count` items on the stackable hash.
//! - `shulker_count > 0` requests `shulker_count` full boxes on the
//!   full-shulker hash when the server tracks one. Otherwise the boxes are
//!   decomposed into raw items: `shulker_count * stack_size * 27`.
//!
//! An item with both counts set yields two filters. Items with both counts
//! zero yield none.
//!
//! A pickup always asks for one container's worth of empty slots.
//!
//! Everything here is pure: no I/O and no stored state.

use crate::api::ReservationFilter;
use crate::engine::catalog::CatalogEntry;

/// Slots in a standard container (chest or shulker box).
pub const SLOTS_PER_CONTAINER: usize = 27;

/// One line of a delivery: what to move and how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryItem {
    pub display_name: String,
    pub stackable_hash: String,
    pub full_shulker_stackable_hash: Option<String>,
    /// Items per full slot
    pub stack_size: u32,
    /// Loose items requested
    pub item_count: u64,
    /// Shulker boxes requested
    pub shulker_count: u64,
}

impl DeliveryItem {
    /// Build a delivery line from a catalog entry.
    ///
    /// Stack size comes from the item type's max count.
    pub fn from_catalog(entry: &CatalogEntry, item_count: u64, shulker_count: u64) -> Self {
        Self {
            display_name: entry.display_name.clone(),
            stackable_hash: entry.record.stackable_hash.clone(),
            full_shulker_stackable_hash: entry.record.full_shulker_stackable_hash.clone(),
            stack_size: entry.item_type.max_count,
            item_count,
            shulker_count,
        }
    }

    /// True when nothing is requested for this item.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0 && self.shulker_count == 0
    }

    /// Filters for this item, loose items first.
    pub fn filters(&self) -> Vec<ReservationFilter> {
        let mut filters = Vec::with_capacity(2);

        if self.item_count > 0 {
            filters.push(ReservationFilter::item_match(
                self.stackable_hash.clone(),
                self.item_count,
            ));
        }

        if self.shulker_count > 0 {
            let filter = match &self.full_shulker_stackable_hash {
                Some(hash) => ReservationFilter::item_match(hash.clone(), self.shulker_count),
                None => ReservationFilter::item_match(
                    self.stackable_hash.clone(),
                    shulker_equivalent(self.shulker_count, self.stack_size),
                ),
            };
            filters.push(filter);
        }

        filters
    }
}

/// Raw items in `shulker_count` fully packed boxes.
pub fn shulker_equivalent(shulker_count: u64, stack_size: u32) -> u64 {
    shulker_count
        .saturating_mul(u64::from(stack_size))
        .saturating_mul(SLOTS_PER_CONTAINER as u64)
}

/// A delivery request: items to send to a named destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryIntent {
    pub destination: String,
    pub items: Vec<DeliveryItem>,
}

impl DeliveryIntent {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            items: Vec::new(),
        }
    }

    /// Add a line to the delivery.
    pub fn with_item(mut self, item: DeliveryItem) -> Self {
        self.items.push(item);
        self
    }

    /// True when no item requests anything.
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(DeliveryItem::is_empty)
    }

    /// Human-readable lines for confirmation output.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for item in &self.items {
            if item.item_count > 0 {
                lines.push(format!(
                    "• {} x{} items",
                    item.display_name, item.item_count
                ));
            }
            if item.shulker_count > 0 {
                lines.push(format!(
                    "• {} x{} shulkers",
                    item.display_name, item.shulker_count
                ));
            }
        }
        lines
    }
}

/// Filters for a delivery, in item order.
pub fn build_delivery_filters(items: &[DeliveryItem]) -> Vec<ReservationFilter> {
    items.iter().flat_map(|item| item.filters()).collect()
}

/// Filters for a pickup: one empty slot per container slot.
pub fn build_pickup_filters() -> Vec<ReservationFilter> {
    vec![ReservationFilter::EmptySlot; SLOTS_PER_CONTAINER]
}
