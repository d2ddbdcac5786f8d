use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, Result, RolodexService};
use rolodex_domain::project;
use rolodex_store::{cache::CacheStore, rebuild::RebuildTracker, registry::EntityRegistry};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RebuildReport {
	pub scope_id: Option<String>,
	pub projected_count: u64,
	pub error_count: u64,
	/// Whether completion was recorded in RebuildState. A dirty pass leaves
	/// the state as-is so the next structural miss re-triggers.
	pub completed: bool,
}

impl RolodexService {
	/// Runs the Rebuild Executor inline. The fire-and-forget path goes
	/// through the notifier chain instead; this entry point serves the admin
	/// surface and the local notifier's spawned task.
	pub async fn rebuild(
		&self,
		scope_id: Option<String>,
		triggered_by: &str,
	) -> Result<RebuildReport> {
		if scope_id.as_deref().is_some_and(|scope| scope.trim().is_empty()) {
			return Err(Error::InvalidRequest {
				message: "scope_id must be non-empty when present.".to_string(),
			});
		}

		Ok(run(&self.registry, &self.cache, &self.rebuild, scope_id, triggered_by).await)
	}
}

/// Re-projects every non-deleted source entity of every registered kind
/// through the same projection as Change Propagation.
///
/// Safe under live traffic: the clear and each upsert are independent short
/// operations, and concurrent writes land through the hook with
/// last-write-wins per key, so the cache only improves while this runs.
pub async fn run(
	registry: &EntityRegistry,
	cache: &CacheStore,
	tracker: &RebuildTracker,
	scope_id: Option<String>,
	triggered_by: &str,
) -> RebuildReport {
	tracing::info!(scope_id = scope_id.as_deref(), triggered_by, "Cache rebuild started.");

	match scope_id.as_deref() {
		Some(scope) => cache.clear_scope(scope),
		None => cache.clear(),
	}

	let mut projected_count = 0_u64;
	let mut error_count = 0_u64;
	let mut scan_failures = 0_u64;

	for (kind, repository) in registry.iter() {
		let entities = match repository.all_active(scope_id.as_deref()).await {
			Ok(entities) => entities,
			Err(err) => {
				tracing::error!(%kind, error = %err, "Rebuild scan failed for kind.");

				scan_failures += 1;

				continue;
			},
		};

		for entity in entities {
			match project(&entity) {
				Ok(entry) => {
					cache.upsert(entry);

					projected_count += 1;
				},
				Err(err) => {
					tracing::warn!(
						%kind,
						entity_id = %entity.entity_id,
						error = %err,
						"Skipping entity that failed projection during rebuild."
					);

					error_count += 1;
				},
			}
		}
	}

	let completed = scan_failures == 0 && error_count == 0;

	if completed {
		tracker.record_rebuild(OffsetDateTime::now_utc());
		tracing::info!(
			scope_id = scope_id.as_deref(),
			projected_count,
			"Cache rebuild completed."
		);
	} else {
		tracing::warn!(
			scope_id = scope_id.as_deref(),
			projected_count,
			error_count,
			scan_failures,
			"Cache rebuild finished dirty; completion not recorded."
		);
	}

	RebuildReport { scope_id, projected_count, error_count: error_count + scan_failures, completed }
}
