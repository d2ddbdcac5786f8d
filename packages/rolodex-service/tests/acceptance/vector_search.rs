use std::{
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use rolodex_domain::EntityKind;
use rolodex_service::SearchRequest;
use rolodex_testkit::{CountingNotifier, TestHarness, embedding, test_config, test_config_toml};

fn search_request(vector: Vec<f32>, min_similarity: Option<f32>) -> SearchRequest {
	SearchRequest {
		vector,
		kind: EntityKind::Person,
		field_name: "summary".to_string(),
		provider_id: "test-provider".to_string(),
		model: "test-model".to_string(),
		min_similarity,
		limit: None,
		owner_id: None,
	}
}

#[tokio::test]
async fn ranks_by_cosine_similarity() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let close = super::record_person(&service, "workspace-1", "sarah-chen").await;
	let far = super::record_person(&service, "workspace-1", "sam-altieri").await;

	harness.vectors.put(embedding(close, "summary", "test-provider", "test-model", vec![
		1.0, 0.0,
	]));
	harness.vectors.put(embedding(far, "summary", "test-provider", "test-model", vec![
		0.6, 0.8,
	]));

	let response = service
		.search(search_request(vec![1.0, 0.0], Some(0.0)))
		.await
		.expect("Search must succeed.");
	let keys = response
		.matches
		.iter()
		.map(|item| item.record.natural_key.as_str())
		.collect::<Vec<_>>();

	assert_eq!(keys, vec!["sarah-chen", "sam-altieri"]);
	assert!((response.matches[0].score - 1.0).abs() < 1e-6);
	assert!((response.matches[1].score - 0.6).abs() < 1e-6);
}

#[tokio::test]
async fn min_similarity_filters_weak_matches() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let close = super::record_person(&service, "workspace-1", "sarah-chen").await;
	let far = super::record_person(&service, "workspace-1", "sam-altieri").await;

	harness.vectors.put(embedding(close, "summary", "test-provider", "test-model", vec![
		1.0, 0.0,
	]));
	harness.vectors.put(embedding(far, "summary", "test-provider", "test-model", vec![
		0.6, 0.8,
	]));

	let response = service
		.search(search_request(vec![1.0, 0.0], Some(0.7)))
		.await
		.expect("Search must succeed.");

	assert_eq!(response.matches.len(), 1);
	assert_eq!(response.matches[0].record.natural_key, "sarah-chen");
}

#[tokio::test]
async fn provider_normalization_selects_inner_product() {
	let harness = TestHarness::new();
	let cfg = test_config_toml(
		r#"
[service]
http_bind  = "127.0.0.1:0"
admin_bind = "127.0.0.1:0"
log_level  = "info"

[search.normalization]
test-provider = "dot"

[security]
rebuild_secret = "test-secret"
"#,
	);
	let service = harness.service(cfg);
	let entity_id = super::record_person(&service, "workspace-1", "sarah-chen").await;

	harness.vectors.put(embedding(entity_id, "summary", "test-provider", "test-model", vec![
		2.0, 0.0,
	]));

	let response = service
		.search(search_request(vec![1.0, 0.0], Some(0.7)))
		.await
		.expect("Search must succeed.");

	// Cosine would report 1.0; the raw inner product proves the provider's
	// convention was honored.
	assert_eq!(response.matches.len(), 1);
	assert!((response.matches[0].score - 2.0).abs() < 1e-6);
}

#[tokio::test]
async fn kind_and_owner_filters_restrict_the_join() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let person = super::record_person(&service, "workspace-1", "sarah-chen").await;
	let organization =
		super::record(&service, EntityKind::Organization, "workspace-1", "acme-corp", None, vec![])
			.await;
	let private = super::record(
		&service,
		EntityKind::Person,
		"workspace-1",
		"shadow-profile",
		Some("alice"),
		vec![],
	)
	.await;

	for entity_id in [person, organization, private] {
		harness.vectors.put(embedding(entity_id, "summary", "test-provider", "test-model", vec![
			1.0, 0.0,
		]));
	}

	let response = service
		.search(search_request(vec![1.0, 0.0], Some(0.5)))
		.await
		.expect("Search must succeed.");
	let keys = response
		.matches
		.iter()
		.map(|item| item.record.natural_key.as_str())
		.collect::<Vec<_>>();

	assert_eq!(keys, vec!["sarah-chen"]);
}

#[tokio::test]
async fn mismatched_dimensions_are_skipped() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let entity_id = super::record_person(&service, "workspace-1", "sarah-chen").await;

	harness.vectors.put(embedding(entity_id, "summary", "test-provider", "test-model", vec![
		1.0, 0.0, 0.0,
	]));

	let response = service
		.search(search_request(vec![1.0, 0.0], Some(0.0)))
		.await
		.expect("Search must succeed despite the bad embedding.");

	assert!(response.matches.is_empty());
}

#[tokio::test]
async fn empty_search_never_triggers_healing() {
	let harness = TestHarness::new();
	let counting = Arc::new(CountingNotifier::new());
	let calls = counting.calls.clone();
	let service = harness.service(test_config()).with_notifiers(vec![counting]);

	super::record_person(&service, "workspace-1", "sarah-chen").await;
	harness.cache.clear();

	let response = service
		.search(search_request(vec![1.0, 0.0], None))
		.await
		.expect("Search must succeed.");

	assert!(response.matches.is_empty());

	tokio::time::sleep(Duration::from_millis(50)).await;

	// An empty semantic match is a legitimate outcome, not cache loss.
	assert_eq!(calls.load(Ordering::SeqCst), 0);
	assert_eq!(service.rebuild_state().trigger_count, 0);
}
