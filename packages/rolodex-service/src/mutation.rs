use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, RolodexService};
use rolodex_domain::{EntityEdge, EntityKind, SourceEntity};

#[derive(Debug, Deserialize, Serialize)]
pub struct RecordEntityRequest {
	pub kind: EntityKind,
	pub scope_id: String,
	#[serde(default)]
	pub owner_id: Option<String>,
	pub natural_key: String,
	pub display_name: String,
	#[serde(default)]
	pub body: String,
	#[serde(default)]
	pub edges: Vec<EntityEdge>,
	#[serde(default)]
	pub metadata: Value,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RecordEntityResponse {
	pub entity_id: Uuid,
	pub created: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RemoveEntityRequest {
	pub kind: EntityKind,
	pub entity_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RemoveEntityResponse {
	pub entity_id: Uuid,
}

impl RolodexService {
	/// Creates or updates a source entity by `(scope_id, natural_key)`.
	///
	/// Propagation runs inside the repository write, so the cache entry is
	/// readable as soon as this returns.
	pub async fn record(&self, request: RecordEntityRequest) -> Result<RecordEntityResponse> {
		if request.scope_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "scope_id must be non-empty.".to_string() });
		}
		if request.natural_key.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "natural_key must be non-empty.".to_string(),
			});
		}
		if request.display_name.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "display_name must be non-empty.".to_string(),
			});
		}

		let repository = self.registry.repository(request.kind)?;
		let now = OffsetDateTime::now_utc();
		let existing =
			repository.get_by_key(&request.scope_id, &request.natural_key).await?;
		let created = existing.is_none();

		// Cache entries are keyed by (scope_id, natural_key) alone, so the
		// key must be free across every kind, not just this one.
		if created {
			for (kind, other) in self.registry.iter() {
				if kind == request.kind {
					continue;
				}
				if other
					.get_by_key(&request.scope_id, &request.natural_key)
					.await?
					.is_some()
				{
					return Err(Error::Conflict {
						message: format!(
							"Natural key {} is already taken in scope {} by a {kind} entity.",
							request.natural_key, request.scope_id
						),
					});
				}
			}
		}

		let (entity_id, created_at) = match &existing {
			Some(previous) => (previous.entity_id, previous.created_at),
			None => (Uuid::new_v4(), now),
		};
		let entity = SourceEntity {
			entity_id,
			kind: request.kind,
			scope_id: request.scope_id,
			owner_id: request.owner_id,
			natural_key: request.natural_key,
			display_name: request.display_name,
			body: request.body,
			edges: request.edges,
			metadata: request.metadata,
			created_at,
			updated_at: now,
			deleted_at: None,
		};

		repository.upsert(entity).await?;

		Ok(RecordEntityResponse { entity_id, created })
	}

	/// Soft-deletes a source entity; propagation removes its cache entry in
	/// the same unit of work.
	pub async fn remove(&self, request: RemoveEntityRequest) -> Result<RemoveEntityResponse> {
		let repository = self.registry.repository(request.kind)?;
		let removed = repository.soft_delete(request.entity_id).await?;

		Ok(RemoveEntityResponse { entity_id: removed.entity_id })
	}
}
