use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use rolodex_config::Config;
use rolodex_domain::{EmbeddingVector, EntityEdge, EntityKind, SourceEntity};
use rolodex_service::{BoxFuture, CacheProjector, RebuildNotifier, RolodexService};
use rolodex_store::{
	cache::CacheStore,
	memory::MemoryRepository,
	rebuild::RebuildTracker,
	registry::EntityRegistry,
	vectors::MemoryVectorIndex,
};

pub fn test_config() -> Config {
	test_config_toml(
		r#"
[service]
http_bind  = "127.0.0.1:0"
admin_bind = "127.0.0.1:0"
log_level  = "info"

[security]
rebuild_secret = "test-secret"
"#,
	)
}

pub fn test_config_toml(raw: &str) -> Config {
	let cfg: Config = toml::from_str(raw).expect("Failed to parse test config.");

	rolodex_config::validate(&cfg).expect("Test config failed validation.");

	cfg
}

/// Everything a wired service is built from, exposed so tests can reach the
/// stores directly.
pub struct TestHarness {
	pub cache: Arc<CacheStore>,
	pub registry: Arc<EntityRegistry>,
	pub vectors: Arc<MemoryVectorIndex>,
	pub tracker: Arc<RebuildTracker>,
}
impl TestHarness {
	pub fn new() -> Self {
		let cache = Arc::new(CacheStore::new());
		let projector = Arc::new(CacheProjector::new(cache.clone()));
		let mut registry = EntityRegistry::new();

		for kind in EntityKind::ALL {
			registry.register(Arc::new(MemoryRepository::new(kind, projector.clone())));
		}

		Self {
			cache,
			registry: Arc::new(registry),
			vectors: Arc::new(MemoryVectorIndex::new()),
			tracker: Arc::new(RebuildTracker::new()),
		}
	}

	pub fn service(&self, cfg: Config) -> RolodexService {
		RolodexService::new(
			cfg,
			self.cache.clone(),
			self.registry.clone(),
			self.vectors.clone(),
			self.tracker.clone(),
		)
	}

	pub fn service_with_local_rebuild(&self, cfg: Config) -> RolodexService {
		let local = Arc::new(rolodex_service::LocalRebuildNotifier::new(
			self.cache.clone(),
			self.registry.clone(),
			self.tracker.clone(),
			cfg.rebuild.scoped,
		));

		self.service(cfg).with_notifiers(vec![local])
	}
}
impl Default for TestHarness {
	fn default() -> Self {
		Self::new()
	}
}

pub fn entity(kind: EntityKind, scope_id: &str, natural_key: &str) -> SourceEntity {
	let now = OffsetDateTime::now_utc();

	SourceEntity {
		entity_id: Uuid::new_v4(),
		kind,
		scope_id: scope_id.to_string(),
		owner_id: None,
		natural_key: natural_key.to_string(),
		display_name: natural_key.replace('-', " "),
		body: String::new(),
		edges: vec![],
		metadata: json!({}),
		created_at: now,
		updated_at: now,
		deleted_at: None,
	}
}

pub fn edge(dst_key: &str, rel_type: &str) -> EntityEdge {
	EntityEdge { dst_key: dst_key.to_string(), rel_type: rel_type.to_string(), weight: 1.0 }
}

pub fn embedding(
	entity_id: Uuid,
	field_name: &str,
	provider_id: &str,
	model: &str,
	vec: Vec<f32>,
) -> EmbeddingVector {
	EmbeddingVector {
		entity_id,
		field_name: field_name.to_string(),
		provider_id: provider_id.to_string(),
		model: model.to_string(),
		vec,
	}
}

/// Counts dispatches; optionally forwards to an inner notifier so tests can
/// both observe and run the rebuild.
pub struct CountingNotifier {
	pub calls: Arc<AtomicUsize>,
	pub inner: Option<Arc<dyn RebuildNotifier>>,
}
impl CountingNotifier {
	pub fn new() -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), inner: None }
	}

	pub fn forwarding(inner: Arc<dyn RebuildNotifier>) -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), inner: Some(inner) }
	}
}
impl Default for CountingNotifier {
	fn default() -> Self {
		Self::new()
	}
}
impl RebuildNotifier for CountingNotifier {
	fn name(&self) -> &'static str {
		"counting"
	}

	fn notify<'a>(
		&'a self,
		scope_id: &'a str,
		triggered_by: &'a str,
	) -> BoxFuture<'a, rolodex_service::Result<()>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			match &self.inner {
				Some(inner) => inner.notify(scope_id, triggered_by).await,
				None => Ok(()),
			}
		})
	}
}

/// Always refuses the dispatch, for exercising the fallback order.
pub struct FailingNotifier;
impl RebuildNotifier for FailingNotifier {
	fn name(&self) -> &'static str {
		"failing"
	}

	fn notify<'a>(
		&'a self,
		_scope_id: &'a str,
		_triggered_by: &'a str,
	) -> BoxFuture<'a, rolodex_service::Result<()>> {
		Box::pin(async move {
			Err(rolodex_service::Error::Storage { message: "Dispatch refused.".to_string() })
		})
	}
}
