use std::{sync::Arc, time::Duration};

use crate::{BoxFuture, Error, Result, rebuild};
use rolodex_config::Config;
use rolodex_store::{cache::CacheStore, rebuild::RebuildTracker, registry::EntityRegistry};

pub const REBUILD_SECRET_HEADER: &str = "x-rolodex-rebuild-secret";

const REMOTE_TIMEOUT_SECS: u64 = 5;

/// One way of getting a rebuild to run. The Coordinator walks its notifier
/// chain in order and stops at the first success.
pub trait RebuildNotifier
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn notify<'a>(&'a self, scope_id: &'a str, triggered_by: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Hands the rebuild to a dedicated rebuild service over HTTP, expecting
/// 202 Accepted.
pub struct RemoteRebuildNotifier {
	client: reqwest::Client,
	endpoint: String,
	secret: String,
}
impl RemoteRebuildNotifier {
	pub fn new(base_url: &str, secret: String) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
			.build()
			.map_err(|err| Error::Storage { message: err.to_string() })?;
		let endpoint = format!("{}/v1/admin/rebuild", base_url.trim_end_matches('/'));

		Ok(Self { client, endpoint, secret })
	}
}
impl RebuildNotifier for RemoteRebuildNotifier {
	fn name(&self) -> &'static str {
		"remote"
	}

	fn notify<'a>(&'a self, scope_id: &'a str, triggered_by: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let response = self
				.client
				.post(&self.endpoint)
				.header(REBUILD_SECRET_HEADER, &self.secret)
				.json(&serde_json::json!({
					"scope_id": scope_id,
					"triggered_by": triggered_by,
				}))
				.send()
				.await
				.map_err(|err| Error::Storage { message: err.to_string() })?;

			if response.status() != reqwest::StatusCode::ACCEPTED {
				return Err(Error::Storage {
					message: format!(
						"Rebuild service answered {} instead of 202.",
						response.status()
					),
				});
			}

			Ok(())
		})
	}
}

/// Runs the Rebuild Executor on a deferred background task in this process.
pub struct LocalRebuildNotifier {
	cache: Arc<CacheStore>,
	registry: Arc<EntityRegistry>,
	tracker: Arc<RebuildTracker>,
	scoped: bool,
}
impl LocalRebuildNotifier {
	pub fn new(
		cache: Arc<CacheStore>,
		registry: Arc<EntityRegistry>,
		tracker: Arc<RebuildTracker>,
		scoped: bool,
	) -> Self {
		Self { cache, registry, tracker, scoped }
	}
}
impl RebuildNotifier for LocalRebuildNotifier {
	fn name(&self) -> &'static str {
		"local"
	}

	fn notify<'a>(&'a self, scope_id: &'a str, triggered_by: &'a str) -> BoxFuture<'a, Result<()>> {
		let cache = self.cache.clone();
		let registry = self.registry.clone();
		let tracker = self.tracker.clone();
		let scope_id = self.scoped.then(|| scope_id.to_string());
		let triggered_by = triggered_by.to_string();

		tokio::spawn(async move {
			rebuild::run(&registry, &cache, &tracker, scope_id, &triggered_by).await;
		});

		Box::pin(async move { Ok(()) })
	}
}

/// The configured dispatch order: remote rebuild service when one is
/// configured, then the local deferred task.
pub fn default_chain(
	cfg: &Config,
	cache: Arc<CacheStore>,
	registry: Arc<EntityRegistry>,
	tracker: Arc<RebuildTracker>,
) -> Result<Vec<Arc<dyn RebuildNotifier>>> {
	let mut chain: Vec<Arc<dyn RebuildNotifier>> = Vec::new();

	if let Some(remote_url) = cfg.rebuild.remote_url.as_deref() {
		chain.push(Arc::new(RemoteRebuildNotifier::new(
			remote_url,
			cfg.security.rebuild_secret.clone(),
		)?));
	}

	chain.push(Arc::new(LocalRebuildNotifier::new(cache, registry, tracker, cfg.rebuild.scoped)));

	Ok(chain)
}

/// Walks the chain until a notifier accepts the dispatch. Failures are
/// logged, never raised: triggering must not fail the query that found the
/// miss.
pub(crate) async fn dispatch_chain(
	notifiers: &[Arc<dyn RebuildNotifier>],
	scope_id: &str,
	triggered_by: &str,
) {
	if notifiers.is_empty() {
		tracing::warn!(
			scope_id,
			"No rebuild notifier configured; the cache stays cold until one dispatches."
		);

		return;
	}

	for notifier in notifiers {
		match notifier.notify(scope_id, triggered_by).await {
			Ok(()) => {
				tracing::info!(scope_id, notifier = notifier.name(), "Rebuild dispatched.");

				return;
			},
			Err(err) => tracing::warn!(
				scope_id,
				notifier = notifier.name(),
				error = %err,
				"Rebuild dispatch failed; falling back to the next notifier."
			),
		}
	}

	tracing::warn!(
		scope_id,
		"Every rebuild notifier failed; the next structural miss retries after the debounce window."
	);
}
