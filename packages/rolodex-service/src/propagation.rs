use std::sync::Arc;

use rolodex_domain::{SourceEntity, project};
use rolodex_store::{cache::CacheStore, registry::MutationHook};

/// Change Propagation: projects every source mutation into the Cache Store.
///
/// Repositories call this synchronously inside their unit of work, so a
/// projection failure aborts the originating write and the exactly-one-entry
/// invariant holds unconditionally. The Rebuild Executor goes through the
/// same `project` function.
pub struct CacheProjector {
	cache: Arc<CacheStore>,
}
impl CacheProjector {
	pub fn new(cache: Arc<CacheStore>) -> Self {
		Self { cache }
	}
}
impl MutationHook for CacheProjector {
	fn entity_saved(&self, entity: &SourceEntity) -> rolodex_store::Result<()> {
		let entry = project(entity)?;

		self.cache.upsert(entry);

		Ok(())
	}

	fn entity_removed(&self, entity: &SourceEntity) -> rolodex_store::Result<()> {
		self.cache.delete(entity.entity_id);

		Ok(())
	}
}
