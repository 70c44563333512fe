//! core::types
//!
//! Domain types shared with the automation server.
//!
//! # Types
//!
//! - [`Vec3`], [`Dimension`], [`Location`] - World coordinates
//! - [`ItemType`] - Immutable item metadata from `/data/items`
//! - [`InventoryRecord`] - Live stock fact from `/automation/inventory_listing`
//! - [`Node`], [`SignConfig`] - Named site locations from `/automation/sign_config`
//! - [`HoldId`], [`Hold`], [`Expiry`] - Server-issued slot reservations
//! - [`Stats`] - Server counters from `/admin/stats`
//!
//! The server is the system of record for all of these. The client never
//! mutates them and never caches them across fetches.
//!
//! # Examples
//!
//! ```
//! use sorting_operator::core::types::{ItemType, Vec3};
//!
//! let unknown = ItemType::unknown(99, 16);
//! assert_eq!(unknown.display_name, "Unknown Item 99");
//! assert_eq!(unknown.key, "unknown:99");
//!
//! assert_eq!(Vec3 { x: 1, y: -2, z: 3 }.to_string(), "(1, -2, 3)");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An integer block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// World dimension a location belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    TheNether,
    Overworld,
    TheEnd,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::TheNether => write!(f, "the nether"),
            Dimension::Overworld => write!(f, "overworld"),
            Dimension::TheEnd => write!(f, "the end"),
        }
    }
}

/// A position qualified by its dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub vec3: Vec3,
    pub dim: Dimension,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.vec3, self.dim)
    }
}

/// Item metadata, keyed by the server's raw numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemType {
    /// Numeric item id
    pub raw_id: u32,
    /// Stable namespaced key (e.g. `minecraft:stone`)
    pub key: String,
    /// Maximum stack size for one slot
    pub max_count: u32,
    /// Human-readable name
    pub display_name: String,
}

impl ItemType {
    /// Placeholder for an inventory record whose id has no metadata.
    ///
    /// The stack size of the record stands in for the missing `max_count`.
    pub fn unknown(item_id: u32, stack_size: u32) -> Self {
        Self {
            raw_id: item_id,
            key: format!("unknown:{}", item_id),
            max_count: stack_size,
            display_name: format!("Unknown Item {}", item_id),
        }
    }
}

/// A live stock count for one stackable identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Numeric item id (joins against [`ItemType::raw_id`])
    pub item_id: u32,
    /// Total count held in storage
    pub count: u32,
    /// Opaque item components, passed through untouched
    #[serde(default, alias = "nbt", skip_serializing_if = "Option::is_none")]
    pub data_components: Option<serde_json::Value>,
    /// Items per full slot
    pub stack_size: u32,
    /// Identity for stacking purposes
    pub stackable_hash: String,
    /// Identity of a shulker box fully packed with this item, if the server tracks one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_shulker_stackable_hash: Option<String>,
}

/// A named location from the site's sign configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Where an agent stands when servicing this node
    pub location: Location,
    #[serde(default)]
    pub name: String,
    /// Chest that items are picked up from
    #[serde(default)]
    pub pickup: Option<Vec3>,
    /// Point that delivered items are thrown towards
    #[serde(default)]
    pub dropoff: Option<Vec3>,
    #[serde(default)]
    pub home: bool,
}

/// Site configuration: every node, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignConfig {
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,
}

impl SignConfig {
    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Names of nodes that accept deliveries, sorted.
    pub fn delivery_destinations(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.dropoff.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Names of nodes with a pickup chest, sorted.
    pub fn pickup_locations(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.pickup.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// The node flagged as home, if any.
    pub fn home(&self) -> Option<(&str, &Node)> {
        self.nodes
            .iter()
            .find(|(_, node)| node.home)
            .map(|(name, node)| (name.as_str(), node))
    }
}

/// Server-issued identifier of a hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(String);

impl HoldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HoldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// When a hold lapses, as reported by the server.
///
/// A timestamp that is not RFC 3339 is kept as raw JSON so the hold around
/// it still decodes and can be released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expiry {
    At(DateTime<Utc>),
    Unparsed(serde_json::Value),
}

impl Expiry {
    /// The parsed expiry, if the server sent RFC 3339.
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::At(at) => Some(*at),
            Expiry::Unparsed(_) => None,
        }
    }
}

impl Default for Expiry {
    fn default() -> Self {
        Expiry::Unparsed(serde_json::Value::Null)
    }
}

/// A time-bounded exclusive claim on one storage slot.
///
/// Only the id matters to the client; it must be released explicitly
/// rather than left to expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    pub location: Location,
    pub slot: u32,
    #[serde(default)]
    pub valid_until: Expiry,
}

/// Server counters, consumed read-only by `sso stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub inventories_in_mem: u64,
    pub total_slots: u64,
    pub free_slots: u64,
    pub current_holds: u64,
    pub operations_pending: u64,
    pub operations_in_progress: u64,
    pub operations_complete: u64,
    pub operations_aborted: u64,
    pub agents_connected: u64,
    pub services_tick_times_micros: BTreeMap<String, u64>,
}

impl Stats {
    /// Percentage of slots in use, or `None` when no slots are known.
    pub fn usage_percent(&self) -> Option<f64> {
        if self.total_slots == 0 {
            return None;
        }
        let used = self.total_slots.saturating_sub(self.free_slots);
        Some(used as f64 / self.total_slots as f64 * 100.0)
    }

    /// Service tick times, slowest first.
    pub fn services_by_tick_time(&self) -> Vec<(&str, u64)> {
        let mut times: Vec<(&str, u64)> = self
            .services_tick_times_micros
            .iter()
            .map(|(name, micros)| (name.as_str(), *micros))
            .collect();
        times.sort_by(|a, b| b.1.cmp(&a.1));
        times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn node(dropoff: Option<Vec3>, pickup: Option<Vec3>, home: bool) -> Node {
        Node {
            location: Location {
                vec3: Vec3 { x: 0, y: 64, z: 0 },
                dim: Dimension::Overworld,
            },
            name: String::new(),
            pickup,
            dropoff,
            home,
        }
    }

    #[test]
    fn unknown_item_type_uses_record_stack_size() {
        let t = ItemType::unknown(7, 16);
        assert_eq!(t.raw_id, 7);
        assert_eq!(t.key, "unknown:7");
        assert_eq!(t.max_count, 16);
        assert_eq!(t.display_name, "Unknown Item 7");
    }

    #[test]
    fn item_type_uses_camel_case_on_the_wire() {
        let json = r#"{"rawId":1,"key":"minecraft:stone","maxCount":64,"displayName":"Stone"}"#;
        let t: ItemType = serde_json::from_str(json).unwrap();
        assert_eq!(t.raw_id, 1);
        assert_eq!(t.max_count, 64);
        assert_eq!(t.display_name, "Stone");
    }

    #[test]
    fn inventory_record_accepts_nbt_alias_and_missing_shulker_hash() {
        let json = r#"{
            "item_id": 1,
            "count": 640,
            "nbt": {"a": 1},
            "stack_size": 64,
            "stackable_hash": "12345"
        }"#;
        let r: InventoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.count, 640);
        assert!(r.data_components.is_some());
        assert!(r.full_shulker_stackable_hash.is_none());
    }

    #[test]
    fn sign_config_filters_destinations_and_pickups() {
        let mut config = SignConfig::default();
        let p = Some(Vec3 { x: 1, y: 2, z: 3 });
        config.nodes.insert("b-drop".into(), node(p, None, false));
        config.nodes.insert("a-both".into(), node(p, p, true));
        config.nodes.insert("c-pick".into(), node(None, p, false));
        config.nodes.insert("d-none".into(), node(None, None, false));

        assert_eq!(config.delivery_destinations(), vec!["a-both", "b-drop"]);
        assert_eq!(config.pickup_locations(), vec!["a-both", "c-pick"]);
        assert_eq!(config.home().map(|(name, _)| name), Some("a-both"));
    }

    #[test]
    fn node_parses_null_dropoff() {
        let json = r#"{
            "location": {"vec3": {"x": 1, "y": 2, "z": 3}, "dim": "TheNether"},
            "name": "storage",
            "pickup": {"x": 4, "y": 5, "z": 6},
            "dropoff": null,
            "home": true
        }"#;
        let n: Node = serde_json::from_str(json).unwrap();
        assert_eq!(n.location.dim, Dimension::TheNether);
        assert!(n.dropoff.is_none());
        assert_eq!(n.pickup, Some(Vec3 { x: 4, y: 5, z: 6 }));
        assert!(n.home);
    }

    #[test]
    fn hold_parses_rfc3339_expiry() {
        let json = r#"{
            "id": "h-1",
            "location": {"vec3": {"x": 0, "y": 0, "z": 0}, "dim": "Overworld"},
            "slot": 4,
            "valid_until": "2024-05-01T12:00:00Z"
        }"#;
        let h: Hold = serde_json::from_str(json).unwrap();
        assert_eq!(h.id.as_str(), "h-1");
        assert_eq!(h.slot, 4);
        assert_eq!(
            h.valid_until.at(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn hold_keeps_unparseable_expiry() {
        let json = r#"{
            "id": "h-2",
            "location": {"vec3": {"x": 0, "y": 0, "z": 0}, "dim": "Overworld"},
            "slot": 0,
            "valid_until": "2024-01-01T00:00:00.123456"
        }"#;
        let h: Hold = serde_json::from_str(json).unwrap();
        assert_eq!(h.id.as_str(), "h-2");
        assert_eq!(h.valid_until.at(), None);
        assert_eq!(
            h.valid_until,
            Expiry::Unparsed(serde_json::Value::String("2024-01-01T00:00:00.123456".into()))
        );
    }

    #[test]
    fn hold_without_expiry_decodes() {
        let json = r#"{
            "id": "h-3",
            "location": {"vec3": {"x": 0, "y": 0, "z": 0}, "dim": "Overworld"},
            "slot": 2
        }"#;
        let h: Hold = serde_json::from_str(json).unwrap();
        assert_eq!(h.valid_until, Expiry::default());
    }

    #[test]
    fn stats_usage_and_ordering() {
        let mut stats = Stats {
            total_slots: 200,
            free_slots: 50,
            ..Default::default()
        };
        stats.services_tick_times_micros.insert("fast".into(), 10);
        stats.services_tick_times_micros.insert("slow".into(), 5000);

        assert_eq!(stats.usage_percent(), Some(75.0));
        assert_eq!(
            stats.services_by_tick_time(),
            vec![("slow", 5000), ("fast", 10)]
        );
        assert_eq!(Stats::default().usage_percent(), None);
    }

    #[test]
    fn location_display() {
        let loc = Location {
            vec3: Vec3 { x: 10, y: 64, z: -3 },
            dim: Dimension::Overworld,
        };
        assert_eq!(loc.to_string(), "(10, 64, -3) in overworld");
    }
}
