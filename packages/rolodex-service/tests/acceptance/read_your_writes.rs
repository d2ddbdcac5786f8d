use serde_json::json;

use rolodex_domain::EntityKind;
use rolodex_service::{
	Error, LookupRequest, RecordEntityRequest, RemoveEntityRequest,
};
use rolodex_testkit::{TestHarness, test_config};

#[tokio::test]
async fn lookup_sees_a_record_immediately() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record_person(&service, "workspace-1", "sarah-chen").await;

	let response = service
		.lookup(LookupRequest {
			natural_key: "sarah-chen".to_string(),
			scope_id: "workspace-1".to_string(),
			owner_id: None,
		})
		.await
		.expect("Lookup after record must succeed.");

	assert_eq!(response.kind, EntityKind::Person);
	assert_eq!(response.record.natural_key, "sarah-chen");
	assert_eq!(response.record.display_name, "sarah chen");
}

#[tokio::test]
async fn every_active_entity_has_exactly_one_entry() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record_person(&service, "workspace-1", "sarah-chen").await;
	super::record(&service, EntityKind::Organization, "workspace-1", "acme-corp", None, vec![])
		.await;

	// Updating through the same key must replace, not duplicate.
	service
		.record(RecordEntityRequest {
			kind: EntityKind::Person,
			scope_id: "workspace-1".to_string(),
			owner_id: None,
			natural_key: "sarah-chen".to_string(),
			display_name: "Sarah Chen".to_string(),
			body: "Platform lead.".to_string(),
			edges: vec![],
			metadata: json!({}),
		})
		.await
		.expect("Update must succeed.");

	assert_eq!(harness.cache.entry_count(), 2);

	let entry = harness
		.cache
		.get("workspace-1", "sarah-chen", None)
		.expect("Entry must exist after update.");

	assert!(entry.summary_text.contains("Platform lead."));
}

#[tokio::test]
async fn update_keeps_the_entity_id() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let first = super::record_person(&service, "workspace-1", "sarah-chen").await;
	let second = super::record_person(&service, "workspace-1", "sarah-chen").await;

	assert_eq!(first, second);
}

#[tokio::test]
async fn removal_propagates_in_the_same_write() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let entity_id = super::record_person(&service, "workspace-1", "sarah-chen").await;

	service
		.remove(RemoveEntityRequest { kind: EntityKind::Person, entity_id })
		.await
		.expect("Remove must succeed.");

	assert!(harness.cache.get("workspace-1", "sarah-chen", None).is_none());

	let result = service
		.lookup(LookupRequest {
			natural_key: "sarah-chen".to_string(),
			scope_id: "workspace-1".to_string(),
			owner_id: None,
		})
		.await;

	assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn natural_keys_are_unique_across_kinds() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(&service, EntityKind::Organization, "workspace-1", "acme-corp", None, vec![])
		.await;

	let stolen = service
		.record(RecordEntityRequest {
			kind: EntityKind::Person,
			scope_id: "workspace-1".to_string(),
			owner_id: None,
			natural_key: "acme-corp".to_string(),
			display_name: "Acme Corp".to_string(),
			body: String::new(),
			edges: vec![],
			metadata: json!({}),
		})
		.await;

	assert!(matches!(stolen, Err(Error::Conflict { .. })));

	let entry = harness
		.cache
		.get("workspace-1", "acme-corp", None)
		.expect("The original entry must survive.");

	assert_eq!(entry.kind, EntityKind::Organization);
}

#[tokio::test]
async fn removing_a_missing_entity_is_not_found() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());
	let result = service
		.remove(RemoveEntityRequest { kind: EntityKind::Person, entity_id: uuid::Uuid::new_v4() })
		.await;

	assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn owned_entities_stay_invisible_to_other_owners() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Note,
		"workspace-1",
		"standup-notes",
		Some("alice"),
		vec![],
	)
	.await;

	let for_alice = service
		.lookup(LookupRequest {
			natural_key: "standup-notes".to_string(),
			scope_id: "workspace-1".to_string(),
			owner_id: Some("alice".to_string()),
		})
		.await;
	let for_bob = service
		.lookup(LookupRequest {
			natural_key: "standup-notes".to_string(),
			scope_id: "workspace-1".to_string(),
			owner_id: Some("bob".to_string()),
		})
		.await;

	assert!(for_alice.is_ok());
	assert!(matches!(for_bob, Err(Error::NotFound { .. })));
}
