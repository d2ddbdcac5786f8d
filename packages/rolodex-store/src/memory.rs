use std::sync::{Arc, PoisonError, RwLock};

use ahash::AHashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result,
	registry::{MutationHook, SourceRepository},
};
use rolodex_domain::{EntityKind, SourceEntity};

/// In-process source table for one entity kind.
///
/// The mutation hook runs under the same write lock that commits the row, so
/// propagation is linearized with the write: a hook failure returns before
/// the map changes, and a reader that observes the row also observes its
/// cache entry.
pub struct MemoryRepository {
	kind: EntityKind,
	hook: Arc<dyn MutationHook>,
	rows: RwLock<AHashMap<Uuid, SourceEntity>>,
}
impl MemoryRepository {
	pub fn new(kind: EntityKind, hook: Arc<dyn MutationHook>) -> Self {
		Self { kind, hook, rows: RwLock::new(AHashMap::new()) }
	}

	fn upsert_sync(&self, entity: SourceEntity) -> Result<()> {
		if entity.kind != self.kind {
			return Err(Error::InvalidArgument(format!(
				"Repository for {} cannot store a {} entity.",
				self.kind, entity.kind
			)));
		}
		if entity.deleted_at.is_some() {
			return Err(Error::InvalidArgument(
				"Cannot upsert a soft-deleted entity; use soft_delete.".to_string(),
			));
		}

		let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
		let duplicate = rows.values().any(|row| {
			row.entity_id != entity.entity_id
				&& row.deleted_at.is_none()
				&& row.scope_id == entity.scope_id
				&& row.natural_key == entity.natural_key
		});

		if duplicate {
			return Err(Error::Conflict(format!(
				"Natural key {} is already taken in scope {}.",
				entity.natural_key, entity.scope_id
			)));
		}

		self.hook.entity_saved(&entity)?;

		rows.insert(entity.entity_id, entity);

		Ok(())
	}

	fn soft_delete_sync(&self, entity_id: Uuid) -> Result<SourceEntity> {
		let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
		let Some(row) = rows.get(&entity_id).filter(|row| row.deleted_at.is_none()).cloned()
		else {
			return Err(Error::NotFound(format!("Entity {entity_id} not found.")));
		};
		let mut deleted = row;

		deleted.deleted_at = Some(OffsetDateTime::now_utc());

		self.hook.entity_removed(&deleted)?;

		rows.insert(entity_id, deleted.clone());

		Ok(deleted)
	}
}
impl SourceRepository for MemoryRepository {
	fn kind(&self) -> EntityKind {
		self.kind
	}

	fn upsert(&self, entity: SourceEntity) -> BoxFuture<'_, Result<()>> {
		let result = self.upsert_sync(entity);

		Box::pin(async move { result })
	}

	fn soft_delete(&self, entity_id: Uuid) -> BoxFuture<'_, Result<SourceEntity>> {
		let result = self.soft_delete_sync(entity_id);

		Box::pin(async move { result })
	}

	fn get(&self, entity_id: Uuid) -> BoxFuture<'_, Result<Option<SourceEntity>>> {
		let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
		let row = rows.get(&entity_id).filter(|row| row.deleted_at.is_none()).cloned();

		Box::pin(async move { Ok(row) })
	}

	fn get_by_key<'a>(
		&'a self,
		scope_id: &'a str,
		natural_key: &'a str,
	) -> BoxFuture<'a, Result<Option<SourceEntity>>> {
		let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
		let row = rows
			.values()
			.find(|row| {
				row.deleted_at.is_none()
					&& row.scope_id == scope_id
					&& row.natural_key == natural_key
			})
			.cloned();

		Box::pin(async move { Ok(row) })
	}

	fn all_active<'a>(
		&'a self,
		scope_id: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<SourceEntity>>> {
		let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
		let mut active = rows
			.values()
			.filter(|row| {
				row.deleted_at.is_none()
					&& scope_id.is_none_or(|scope| row.scope_id == scope)
			})
			.cloned()
			.collect::<Vec<_>>();

		active.sort_by(|a, b| a.natural_key.cmp(&b.natural_key));

		Box::pin(async move { Ok(active) })
	}
}
