use std::{collections::BTreeMap, sync::Arc};

use uuid::Uuid;

use crate::{BoxFuture, Result};
use rolodex_domain::{EntityKind, SourceEntity};

/// Synchronous observer invoked by a repository inside the same unit of work
/// as the row mutation. A failure aborts the write, so the cache can never
/// drift from the source tables through a dual-write window.
pub trait MutationHook
where
	Self: Send + Sync,
{
	fn entity_saved(&self, entity: &SourceEntity) -> Result<()>;

	fn entity_removed(&self, entity: &SourceEntity) -> Result<()>;
}

/// No-op hook for wiring a repository without propagation.
pub struct NullHook;
impl MutationHook for NullHook {
	fn entity_saved(&self, _entity: &SourceEntity) -> Result<()> {
		Ok(())
	}

	fn entity_removed(&self, _entity: &SourceEntity) -> Result<()> {
		Ok(())
	}
}

/// One normalized source table. The durable implementation lives outside
/// this system; [`crate::memory::MemoryRepository`] is the process-local
/// stand-in used by the API binary and the tests.
pub trait SourceRepository
where
	Self: Send + Sync,
{
	fn kind(&self) -> EntityKind;

	fn upsert(&self, entity: SourceEntity) -> BoxFuture<'_, Result<()>>;

	fn soft_delete(&self, entity_id: Uuid) -> BoxFuture<'_, Result<SourceEntity>>;

	fn get(&self, entity_id: Uuid) -> BoxFuture<'_, Result<Option<SourceEntity>>>;

	fn get_by_key<'a>(
		&'a self,
		scope_id: &'a str,
		natural_key: &'a str,
	) -> BoxFuture<'a, Result<Option<SourceEntity>>>;

	/// Every non-deleted entity, optionally restricted to one scope.
	fn all_active<'a>(
		&'a self,
		scope_id: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<SourceEntity>>>;
}

/// Entity-kind dispatch table: each kind resolves to its own repository,
/// replacing per-table generated query text with enum-keyed lookup.
#[derive(Default)]
pub struct EntityRegistry {
	repositories: BTreeMap<EntityKind, Arc<dyn SourceRepository>>,
}
impl EntityRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, repository: Arc<dyn SourceRepository>) {
		self.repositories.insert(repository.kind(), repository);
	}

	pub fn repository(&self, kind: EntityKind) -> Result<&Arc<dyn SourceRepository>> {
		self.repositories
			.get(&kind)
			.ok_or_else(|| crate::Error::Storage(format!("No repository registered for {kind}.")))
	}

	pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &Arc<dyn SourceRepository>)> {
		self.repositories.iter().map(|(kind, repository)| (*kind, repository))
	}

	pub fn is_empty(&self) -> bool {
		self.repositories.is_empty()
	}
}
