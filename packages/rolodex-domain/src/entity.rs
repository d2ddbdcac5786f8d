use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Person,
	Organization,
	Event,
	Note,
}
impl EntityKind {
	pub const ALL: [Self; 4] = [Self::Person, Self::Organization, Self::Event, Self::Note];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Person => "person",
			Self::Organization => "organization",
			Self::Event => "event",
			Self::Note => "note",
		}
	}
}
impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Directed edge to another entity, addressed by natural key within the same
/// scope.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EntityEdge {
	pub dst_key: String,
	pub rel_type: String,
	#[serde(default = "default_edge_weight")]
	pub weight: f32,
}

fn default_edge_weight() -> f32 {
	1.0
}

/// A row of the normalized source tables. Owned and mutated by domain logic;
/// the cache holds a denormalized shadow of it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SourceEntity {
	pub entity_id: Uuid,
	pub kind: EntityKind,
	pub scope_id: String,
	pub owner_id: Option<String>,
	pub natural_key: String,
	pub display_name: String,
	pub body: String,
	#[serde(default)]
	pub edges: Vec<EntityEdge>,
	#[serde(default)]
	pub metadata: Value,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(default, with = "crate::time_serde::option")]
	pub deleted_at: Option<OffsetDateTime>,
}

/// Denormalized index record, unique per `(scope_id, natural_key)`.
///
/// `entity_id` is a weak back-reference; the authoritative record stays in
/// the source tables. `owner_id` of `None` means visible to every owner in
/// the scope.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CacheEntry {
	pub scope_id: String,
	pub natural_key: String,
	pub kind: EntityKind,
	pub entity_id: Uuid,
	pub owner_id: Option<String>,
	pub summary_text: String,
	pub edges: Vec<EntityEdge>,
	pub metadata: Value,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl CacheEntry {
	pub fn visible_to(&self, owner_id: Option<&str>) -> bool {
		match self.owner_id.as_deref() {
			None => true,
			Some(owner) => owner_id == Some(owner),
		}
	}
}

/// Externally produced embedding, unique per
/// `(entity_id, field_name, provider_id, model)`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EmbeddingVector {
	pub entity_id: Uuid,
	pub field_name: String,
	pub provider_id: String,
	pub model: String,
	pub vec: Vec<f32>,
}

/// Snapshot of the rebuild singleton. Counters cover debounce-admitted
/// triggers and completed rebuilds.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RebuildState {
	#[serde(default, with = "crate::time_serde::option")]
	pub last_trigger_at: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub last_rebuild_at: Option<OffsetDateTime>,
	pub trigger_count: u64,
	pub rebuild_count: u64,
}
