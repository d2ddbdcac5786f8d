use std::sync::Arc;

use uuid::Uuid;

use rolodex_domain::{EntityKind, SourceEntity};
use rolodex_service::rebuild;
use rolodex_store::{
	BoxFuture, Error as StoreError, cache::CacheStore, rebuild::RebuildTracker,
	registry::{EntityRegistry, SourceRepository},
};
use rolodex_testkit::{TestHarness, edge, test_config};

async fn seeded_service(harness: &TestHarness) -> rolodex_service::RolodexService {
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Person,
		"workspace-1",
		"sarah-chen",
		None,
		vec![edge("acme-corp", "employer")],
	)
	.await;
	super::record(&service, EntityKind::Organization, "workspace-1", "acme-corp", None, vec![])
		.await;
	super::record(&service, EntityKind::Event, "workspace-2", "weekly-sync", None, vec![]).await;

	service
}

#[tokio::test]
async fn rebuild_is_idempotent() {
	let harness = TestHarness::new();
	let service = seeded_service(&harness).await;
	let first = service.rebuild(None, "test").await.expect("First rebuild must succeed.");
	let after_first = harness.cache.entries();
	let second = service.rebuild(None, "test").await.expect("Second rebuild must succeed.");
	let after_second = harness.cache.entries();

	assert_eq!(first.projected_count, 3);
	assert_eq!(second.projected_count, 3);
	assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn rebuild_restores_a_wiped_cache() {
	let harness = TestHarness::new();
	let service = seeded_service(&harness).await;

	harness.cache.clear();

	let report = service.rebuild(None, "test").await.expect("Rebuild must succeed.");

	assert_eq!(report.projected_count, 3);
	assert_eq!(report.error_count, 0);
	assert!(report.completed);
	assert!(harness.cache.get("workspace-1", "sarah-chen", None).is_some());
	assert!(harness.cache.get("workspace-2", "weekly-sync", None).is_some());

	// The denormalized edges come back with the entry.
	let entry = harness
		.cache
		.get("workspace-1", "sarah-chen", None)
		.expect("Entry must exist after rebuild.");

	assert_eq!(entry.edges.len(), 1);
	assert_eq!(entry.edges[0].dst_key, "acme-corp");
}

#[tokio::test]
async fn scoped_rebuild_leaves_other_scopes_alone() {
	let harness = TestHarness::new();
	let service = seeded_service(&harness).await;

	harness.cache.clear();

	let report = service
		.rebuild(Some("workspace-1".to_string()), "test")
		.await
		.expect("Scoped rebuild must succeed.");

	assert_eq!(report.projected_count, 2);
	assert!(harness.cache.get("workspace-1", "sarah-chen", None).is_some());
	assert!(harness.cache.is_empty("workspace-2"));
}

#[tokio::test]
async fn soft_deleted_entities_are_not_resurrected() {
	let harness = TestHarness::new();
	let service = seeded_service(&harness).await;
	let entity_id = super::record_person(&service, "workspace-1", "leaving-soon").await;

	service
		.remove(rolodex_service::RemoveEntityRequest { kind: EntityKind::Person, entity_id })
		.await
		.expect("Remove must succeed.");
	harness.cache.clear();
	service.rebuild(None, "test").await.expect("Rebuild must succeed.");

	assert!(harness.cache.get("workspace-1", "leaving-soon", None).is_none());
	assert!(harness.cache.get("workspace-1", "sarah-chen", None).is_some());
}

#[tokio::test]
async fn completion_is_recorded_only_on_a_clean_pass() {
	let harness = TestHarness::new();
	let service = seeded_service(&harness).await;

	service.rebuild(None, "test").await.expect("Rebuild must succeed.");

	assert_eq!(service.rebuild_state().rebuild_count, 1);
}

struct BrokenRepository;
impl SourceRepository for BrokenRepository {
	fn kind(&self) -> EntityKind {
		EntityKind::Person
	}

	fn upsert(&self, _entity: SourceEntity) -> BoxFuture<'_, rolodex_store::Result<()>> {
		Box::pin(async move { Err(StoreError::Storage("Source table unavailable.".to_string())) })
	}

	fn soft_delete(&self, _entity_id: Uuid) -> BoxFuture<'_, rolodex_store::Result<SourceEntity>> {
		Box::pin(async move { Err(StoreError::Storage("Source table unavailable.".to_string())) })
	}

	fn get(&self, _entity_id: Uuid) -> BoxFuture<'_, rolodex_store::Result<Option<SourceEntity>>> {
		Box::pin(async move { Ok(None) })
	}

	fn get_by_key<'a>(
		&'a self,
		_scope_id: &'a str,
		_natural_key: &'a str,
	) -> BoxFuture<'a, rolodex_store::Result<Option<SourceEntity>>> {
		Box::pin(async move { Ok(None) })
	}

	fn all_active<'a>(
		&'a self,
		_scope_id: Option<&'a str>,
	) -> BoxFuture<'a, rolodex_store::Result<Vec<SourceEntity>>> {
		Box::pin(async move { Err(StoreError::Storage("Source table unavailable.".to_string())) })
	}
}

#[tokio::test]
async fn a_failed_scan_leaves_rebuild_state_untouched() {
	let cache = CacheStore::new();
	let tracker = RebuildTracker::new();
	let mut registry = EntityRegistry::new();

	registry.register(Arc::new(BrokenRepository));

	let report = rebuild::run(&registry, &cache, &tracker, None, "test").await;

	assert!(!report.completed);
	assert_eq!(report.error_count, 1);
	assert_eq!(tracker.snapshot().rebuild_count, 0);
	assert!(tracker.snapshot().last_rebuild_at.is_none());
}
