use crate::entity::{CacheEntry, EntityKind, SourceEntity};

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
	#[error("Entity {entity_id} has an empty natural key.")]
	EmptyNaturalKey { entity_id: uuid::Uuid },
	#[error("Entity {entity_id} has an empty scope id.")]
	EmptyScopeId { entity_id: uuid::Uuid },
	#[error("Entity {entity_id} is soft-deleted and must not be projected.")]
	Deleted { entity_id: uuid::Uuid },
}

/// Projects a source entity into its cache entry.
///
/// This is the single projection code path: Change Propagation calls it on
/// every mutation and the Rebuild Executor calls it for every row it
/// re-projects. Kind dispatch happens here, on the enum, instead of in
/// per-table query text.
pub fn project(entity: &SourceEntity) -> Result<CacheEntry, ProjectionError> {
	if entity.natural_key.trim().is_empty() {
		return Err(ProjectionError::EmptyNaturalKey { entity_id: entity.entity_id });
	}
	if entity.scope_id.trim().is_empty() {
		return Err(ProjectionError::EmptyScopeId { entity_id: entity.entity_id });
	}
	if entity.deleted_at.is_some() {
		return Err(ProjectionError::Deleted { entity_id: entity.entity_id });
	}

	Ok(CacheEntry {
		scope_id: entity.scope_id.clone(),
		natural_key: entity.natural_key.clone(),
		kind: entity.kind,
		entity_id: entity.entity_id,
		owner_id: entity.owner_id.clone(),
		summary_text: summary_text(entity),
		edges: entity.edges.clone(),
		metadata: entity.metadata.clone(),
		updated_at: entity.updated_at,
	})
}

fn summary_text(entity: &SourceEntity) -> String {
	let mut parts = vec![entity.display_name.trim()];

	match entity.kind {
		EntityKind::Person | EntityKind::Organization => {
			// Aliases help fuzzy recall for renamed or nicknamed entities.
			if let Some(aliases) = entity.metadata.get("aliases").and_then(|value| value.as_array())
			{
				parts.extend(aliases.iter().filter_map(|alias| alias.as_str()));
			}
		},
		EntityKind::Event => {
			if let Some(location) =
				entity.metadata.get("location").and_then(|value| value.as_str())
			{
				parts.push(location);
			}
		},
		EntityKind::Note => {},
	}

	parts.push(entity.body.trim());

	let joined = parts.into_iter().filter(|part| !part.is_empty()).collect::<Vec<_>>().join(" ");

	joined
}
