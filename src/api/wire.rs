//! api::wire
//!
//! Request and response bodies for the hold and operation endpoints.
//!
//! # Design
//!
//! Reservation filters, batch outcomes and physical operations are closed
//! sum types. The server's schema fixes the variant set, and serde's
//! externally/internally tagged encodings produce the exact JSON it expects:
//!
//! ```text
//! "EmptySlot"
//! {"ItemMatch": {"match_criteria": {"StackableHash": {"stackable_hash": "42"}}, "total": 64}}
//! {"Holds": {"holds": [...]}} | {"Error": "..."}
//! {"type": "DropItems", "source_holds": [...], "drop_from": {...}, "aim_towards": {...}}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::{Hold, HoldId, Location, Vec3};

/// How an item-match filter identifies candidate slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCriteria {
    StackableHash { stackable_hash: String },
}

/// One request unit inside a hold batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationFilter {
    /// Any empty storage slot.
    EmptySlot,
    /// Slots holding items with a given identity, up to `total` items.
    ItemMatch {
        match_criteria: MatchCriteria,
        total: u64,
    },
}

impl ReservationFilter {
    /// Build an item-match filter on a stackable hash.
    pub fn item_match(stackable_hash: impl Into<String>, total: u64) -> Self {
        ReservationFilter::ItemMatch {
            match_criteria: MatchCriteria::StackableHash {
                stackable_hash: stackable_hash.into(),
            },
            total,
        }
    }

    /// Requested quantity, or `None` for an empty-slot filter.
    pub fn total(&self) -> Option<u64> {
        match self {
            ReservationFilter::EmptySlot => None,
            ReservationFilter::ItemMatch { total, .. } => Some(*total),
        }
    }

    /// Hash being matched, or `None` for an empty-slot filter.
    pub fn stackable_hash(&self) -> Option<&str> {
        match self {
            ReservationFilter::EmptySlot => None,
            ReservationFilter::ItemMatch {
                match_criteria: MatchCriteria::StackableHash { stackable_hash },
                ..
            } => Some(stackable_hash),
        }
    }
}

/// Body of `POST /automation/holds`.
#[derive(Debug, Serialize)]
pub struct HoldRequestBody<'a> {
    pub requests: &'a [ReservationFilter],
}

/// Outcome of a single filter within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldOutcome {
    Holds { holds: Vec<Hold> },
    Error(String),
}

impl HoldOutcome {
    /// Ids granted by this outcome; empty for an error.
    pub fn hold_ids(&self) -> impl Iterator<Item = &HoldId> {
        let holds: &[Hold] = match self {
            HoldOutcome::Holds { holds } => holds,
            HoldOutcome::Error(_) => &[],
        };
        holds.iter().map(|h| &h.id)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            HoldOutcome::Error(message) => Some(message),
            HoldOutcome::Holds { .. } => None,
        }
    }
}

/// Per-filter outcomes, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldBatchResult {
    pub results: Vec<HoldOutcome>,
}

impl HoldBatchResult {
    /// Every granted hold id across the batch, in outcome order.
    pub fn granted_ids(&self) -> Vec<HoldId> {
        self.results
            .iter()
            .flat_map(|outcome| outcome.hold_ids())
            .cloned()
            .collect()
    }

    /// The first error in request order, if any filter failed.
    pub fn first_error(&self) -> Option<&str> {
        self.results.iter().find_map(|outcome| outcome.error())
    }

    /// Number of filters that failed.
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }
}

/// A physical task for an agent to carry out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PhysicalOperation {
    /// Take items out of held source slots and throw them at a drop-off.
    DropItems {
        source_holds: Vec<HoldId>,
        drop_from: Location,
        aim_towards: Vec3,
    },
    /// Empty a chest into held destination slots.
    ImportInventory {
        chest_location: Vec3,
        node_location: Location,
        destination_holds: Vec<HoldId>,
    },
}

impl PhysicalOperation {
    /// Every hold id referenced by this operation.
    pub fn hold_ids(&self) -> &[HoldId] {
        match self {
            PhysicalOperation::DropItems { source_holds, .. } => source_holds,
            PhysicalOperation::ImportInventory {
                destination_holds, ..
            } => destination_holds,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PhysicalOperation::DropItems { .. } => "DropItems",
            PhysicalOperation::ImportInventory { .. } => "ImportInventory",
        }
    }
}

/// Scheduling priority attached to a submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Background,
    LowPriority,
    #[default]
    UserInteractive,
    SystemCritical,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[
            Priority::Background,
            Priority::LowPriority,
            Priority::UserInteractive,
            Priority::SystemCritical,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Priority::Background => "Background",
            Priority::LowPriority => "LowPriority",
            Priority::UserInteractive => "UserInteractive",
            Priority::SystemCritical => "SystemCritical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Priority::all().iter().map(Priority::name).collect();
                format!(
                    "invalid priority '{}', must be one of: {}",
                    s,
                    names.join(", ")
                )
            })
    }
}

/// Body of `POST /automation/operations`.
#[derive(Debug, Serialize)]
pub struct OperationRequest<'a> {
    pub kind: &'a PhysicalOperation,
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Dimension;
    use serde_json::json;

    fn origin() -> Location {
        Location {
            vec3: Vec3 { x: 0, y: 64, z: 0 },
            dim: Dimension::Overworld,
        }
    }

    #[test]
    fn empty_slot_encodes_as_bare_string() {
        let value = serde_json::to_value(ReservationFilter::EmptySlot).unwrap();
        assert_eq!(value, json!("EmptySlot"));
    }

    #[test]
    fn item_match_encodes_nested_criteria() {
        let value = serde_json::to_value(ReservationFilter::item_match("42", 64)).unwrap();
        assert_eq!(
            value,
            json!({
                "ItemMatch": {
                    "match_criteria": {"StackableHash": {"stackable_hash": "42"}},
                    "total": 64
                }
            })
        );
    }

    #[test]
    fn filter_accessors() {
        let f = ReservationFilter::item_match("abc", 10);
        assert_eq!(f.total(), Some(10));
        assert_eq!(f.stackable_hash(), Some("abc"));
        assert_eq!(ReservationFilter::EmptySlot.total(), None);
        assert_eq!(ReservationFilter::EmptySlot.stackable_hash(), None);
    }

    #[test]
    fn batch_result_decodes_mixed_outcomes() {
        let body = json!({
            "results": [
                {"Holds": {"holds": [
                    {"id": "a", "location": {"vec3": {"x": 0, "y": 0, "z": 0}, "dim": "Overworld"},
                     "slot": 0, "valid_until": "2024-01-01T00:00:00Z"},
                    {"id": "b", "location": {"vec3": {"x": 0, "y": 0, "z": 0}, "dim": "Overworld"},
                     "slot": 1, "valid_until": "2024-01-01T00:00:00Z"}
                ]}},
                {"Error": "NoMatch"}
            ]
        });
        let result: HoldBatchResult = serde_json::from_value(body).unwrap();

        assert_eq!(result.results.len(), 2);
        assert_eq!(
            result.granted_ids(),
            vec![HoldId::new("a"), HoldId::new("b")]
        );
        assert_eq!(result.first_error(), Some("NoMatch"));
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn batch_with_odd_expiry_still_yields_ids() {
        let body = r#"{"results":[{"Holds":{"holds":[{"id":"a","location":{"vec3":{"x":1,"y":2,"z":3},"dim":"Overworld"},"slot":0,"valid_until":"2024-01-01T00:00:00.123456"}]}}]}"#;
        let result: HoldBatchResult = serde_json::from_str(body).unwrap();

        assert_eq!(result.granted_ids(), vec![HoldId::new("a")]);
        assert_eq!(result.first_error(), None);
    }

    #[test]
    fn drop_items_is_internally_tagged() {
        let op = PhysicalOperation::DropItems {
            source_holds: vec![HoldId::new("h1")],
            drop_from: origin(),
            aim_towards: Vec3 { x: 1, y: 2, z: 3 },
        };
        let body = OperationRequest {
            kind: &op,
            priority: Priority::UserInteractive,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "kind": {
                    "type": "DropItems",
                    "source_holds": ["h1"],
                    "drop_from": {"vec3": {"x": 0, "y": 64, "z": 0}, "dim": "Overworld"},
                    "aim_towards": {"x": 1, "y": 2, "z": 3}
                },
                "priority": "UserInteractive"
            })
        );
    }

    #[test]
    fn import_inventory_fields() {
        let op = PhysicalOperation::ImportInventory {
            chest_location: Vec3 { x: 5, y: 6, z: 7 },
            node_location: origin(),
            destination_holds: vec![HoldId::new("d1"), HoldId::new("d2")],
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "ImportInventory");
        assert_eq!(value["destination_holds"], json!(["d1", "d2"]));
        assert_eq!(op.hold_ids().len(), 2);
        assert_eq!(op.kind_name(), "ImportInventory");
    }

    #[test]
    fn priority_parse_and_default() {
        assert_eq!(Priority::default(), Priority::UserInteractive);
        assert_eq!(
            "background".parse::<Priority>(),
            Ok(Priority::Background)
        );
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::SystemCritical.to_string(), "SystemCritical");
    }
}
