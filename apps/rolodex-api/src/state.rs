use std::sync::Arc;

use color_eyre::eyre;

use rolodex_service::{CacheProjector, RolodexService, default_chain};
use rolodex_store::{
	cache::CacheStore,
	memory::MemoryRepository,
	rebuild::RebuildTracker,
	registry::EntityRegistry,
	vectors::MemoryVectorIndex,
};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RolodexService>,
}
impl AppState {
	pub fn new(config: rolodex_config::Config) -> color_eyre::Result<Self> {
		let cache = Arc::new(CacheStore::new());
		let projector = Arc::new(CacheProjector::new(cache.clone()));
		let mut registry = EntityRegistry::new();

		for kind in rolodex_domain::EntityKind::ALL {
			registry.register(Arc::new(MemoryRepository::new(kind, projector.clone())));
		}

		let registry = Arc::new(registry);
		let vectors = Arc::new(MemoryVectorIndex::new());
		let tracker = Arc::new(RebuildTracker::new());
		let notifiers =
			default_chain(&config, cache.clone(), registry.clone(), tracker.clone())
				.map_err(|err| eyre::eyre!(err.to_string()))?;
		let service = RolodexService::new(config, cache, registry, vectors, tracker)
			.with_notifiers(notifiers);

		Ok(Self { service: Arc::new(service) })
	}
}
