use std::{
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use rolodex_domain::EntityKind;
use rolodex_service::{Error, TraverseRequest};
use rolodex_testkit::{CountingNotifier, TestHarness, edge, test_config};

fn traverse_request(natural_key: &str, max_depth: u32) -> TraverseRequest {
	TraverseRequest {
		natural_key: natural_key.to_string(),
		scope_id: "workspace-1".to_string(),
		owner_id: None,
		max_depth: Some(max_depth),
		rel_types: None,
	}
}

#[tokio::test]
async fn two_node_cycle_terminates_at_depth_one() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Event,
		"workspace-1",
		"alpha-offsite",
		None,
		vec![edge("sarah-chen", "attendee")],
	)
	.await;
	super::record(
		&service,
		EntityKind::Person,
		"workspace-1",
		"sarah-chen",
		None,
		vec![edge("alpha-offsite", "attendee")],
	)
	.await;

	let response = service
		.traverse(traverse_request("alpha-offsite", 3))
		.await
		.expect("Traverse must succeed.");

	assert_eq!(response.nodes.len(), 1);

	let node = &response.nodes[0];

	assert_eq!(node.natural_key, "sarah-chen");
	assert_eq!(node.depth, 1);
	assert_eq!(node.rel_type, "attendee");
	assert_eq!(node.path, vec!["alpha-offsite".to_string(), "sarah-chen".to_string()]);
}

#[tokio::test]
async fn diamond_graph_deduplicates_to_the_shallowest_depth() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Person,
		"workspace-1",
		"a",
		None,
		vec![edge("b", "knows"), edge("c", "knows")],
	)
	.await;
	super::record(&service, EntityKind::Person, "workspace-1", "b", None, vec![edge("d", "knows")])
		.await;
	super::record(&service, EntityKind::Person, "workspace-1", "c", None, vec![edge("d", "knows")])
		.await;
	super::record(&service, EntityKind::Person, "workspace-1", "d", None, vec![edge("a", "knows")])
		.await;

	let response =
		service.traverse(traverse_request("a", 3)).await.expect("Traverse must succeed.");
	let mut summary = response
		.nodes
		.iter()
		.map(|node| (node.natural_key.as_str(), node.depth))
		.collect::<Vec<_>>();

	summary.sort();

	// d is reachable over two paths but appears once, at its shallowest
	// depth, and the cycle back to a never surfaces.
	assert_eq!(summary, vec![("b", 1), ("c", 1), ("d", 2)]);
}

#[tokio::test]
async fn max_depth_bounds_the_expansion() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(&service, EntityKind::Person, "workspace-1", "a", None, vec![edge("b", "knows")])
		.await;
	super::record(&service, EntityKind::Person, "workspace-1", "b", None, vec![edge("c", "knows")])
		.await;
	super::record(&service, EntityKind::Person, "workspace-1", "c", None, vec![]).await;

	let response =
		service.traverse(traverse_request("a", 1)).await.expect("Traverse must succeed.");
	let keys = response.nodes.iter().map(|node| node.natural_key.as_str()).collect::<Vec<_>>();

	assert_eq!(keys, vec!["b"]);
}

#[tokio::test]
async fn rel_type_allow_list_filters_edges() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Event,
		"workspace-1",
		"alpha-offsite",
		None,
		vec![edge("sarah-chen", "attendee"), edge("acme-corp", "host")],
	)
	.await;
	super::record_person(&service, "workspace-1", "sarah-chen").await;
	super::record(&service, EntityKind::Organization, "workspace-1", "acme-corp", None, vec![])
		.await;

	let response = service
		.traverse(TraverseRequest {
			natural_key: "alpha-offsite".to_string(),
			scope_id: "workspace-1".to_string(),
			owner_id: None,
			max_depth: Some(2),
			rel_types: Some(vec!["attendee".to_string()]),
		})
		.await
		.expect("Traverse must succeed.");
	let keys = response.nodes.iter().map(|node| node.natural_key.as_str()).collect::<Vec<_>>();

	assert_eq!(keys, vec!["sarah-chen"]);
}

#[tokio::test]
async fn dangling_edges_are_dropped_silently() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Person,
		"workspace-1",
		"sarah-chen",
		None,
		vec![edge("not-cached-yet", "knows")],
	)
	.await;

	let response = service
		.traverse(traverse_request("sarah-chen", 2))
		.await
		.expect("Traverse must succeed.");

	assert!(response.nodes.is_empty());
}

#[tokio::test]
async fn invisible_targets_are_dead_ends() {
	let harness = TestHarness::new();
	let service = harness.service(test_config());

	super::record(
		&service,
		EntityKind::Person,
		"workspace-1",
		"sarah-chen",
		None,
		vec![edge("private-notes", "author-of")],
	)
	.await;
	super::record(
		&service,
		EntityKind::Note,
		"workspace-1",
		"private-notes",
		Some("alice"),
		vec![],
	)
	.await;

	let response = service
		.traverse(traverse_request("sarah-chen", 1))
		.await
		.expect("Traverse must succeed.");

	assert!(response.nodes.is_empty());
}

#[tokio::test]
async fn absent_start_key_is_not_found_and_evaluates_healing() {
	let harness = TestHarness::new();
	let counting = Arc::new(CountingNotifier::new());
	let calls = counting.calls.clone();
	let service = harness.service(test_config()).with_notifiers(vec![counting]);
	let result = service.traverse(traverse_request("sarah-chen", 1)).await;

	assert!(matches!(result, Err(Error::NotFound { .. })));

	let dispatched =
		super::wait_until(|| calls.load(Ordering::SeqCst) == 1, Duration::from_secs(2)).await;

	assert!(dispatched, "An absent start over an empty scope must dispatch.");
}
