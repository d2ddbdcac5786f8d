pub mod fuzzy;
pub mod heal;
pub mod lookup;
pub mod mutation;
pub mod notify;
pub mod propagation;
pub mod rebuild;
pub mod search;
pub mod traverse;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use error::{Error, Result};
pub use fuzzy::{FuzzyMatch, FuzzyRequest, FuzzyResponse};
pub use lookup::{LookupRequest, LookupResponse};
pub use mutation::{
	RecordEntityRequest, RecordEntityResponse, RemoveEntityRequest, RemoveEntityResponse,
};
pub use notify::{
	LocalRebuildNotifier, REBUILD_SECRET_HEADER, RebuildNotifier, RemoteRebuildNotifier,
	default_chain,
};
pub use propagation::CacheProjector;
pub use rebuild::RebuildReport;
pub use search::{SearchMatch, SearchRequest, SearchResponse};
pub use traverse::{TraverseNode, TraverseRequest, TraverseResponse};

use rolodex_config::Config;
use rolodex_domain::RebuildState;
use rolodex_store::{
	cache::CacheStore, rebuild::RebuildTracker, registry::EntityRegistry, vectors::VectorIndex,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub struct RolodexService {
	pub cfg: Config,
	pub cache: Arc<CacheStore>,
	pub registry: Arc<EntityRegistry>,
	pub vectors: Arc<dyn VectorIndex>,
	pub rebuild: Arc<RebuildTracker>,
	pub notifiers: Vec<Arc<dyn RebuildNotifier>>,
}
impl RolodexService {
	pub fn new(
		cfg: Config,
		cache: Arc<CacheStore>,
		registry: Arc<EntityRegistry>,
		vectors: Arc<dyn VectorIndex>,
		rebuild: Arc<RebuildTracker>,
	) -> Self {
		Self { cfg, cache, registry, vectors, rebuild, notifiers: Vec::new() }
	}

	pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn RebuildNotifier>>) -> Self {
		self.notifiers = notifiers;

		self
	}

	/// Metrics snapshot; never blocks the Coordinator or the Executor.
	pub fn rebuild_state(&self) -> RebuildState {
		self.rebuild.snapshot()
	}
}
