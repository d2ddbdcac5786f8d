use time::OffsetDateTime;

use crate::{RolodexService, notify};

/// Fixed resource id for the dispatch try-lock, logged for correlation.
pub(crate) const REBUILD_LOCK_ID: i64 = 7_200_219;

impl RolodexService {
	/// The Rebuild Coordinator's state machine, entered on every structural
	/// miss: empty-scope probe, debounce, try-lock, asynchronous dispatch.
	///
	/// Every exit path returns without blocking the calling query, and
	/// nothing here can fail the caller: dispatch problems are logged and
	/// heal on the next debounce window.
	pub(crate) fn evaluate_self_heal(&self, scope_id: &str, origin: &'static str) {
		if !self.cache.is_empty(scope_id) {
			// An ordinary miss against a warm scope; nothing to repair.
			return;
		}

		let now = OffsetDateTime::now_utc();

		if !self.rebuild.mark_trigger(now, self.cfg.rebuild.debounce_window_secs) {
			tracing::trace!(scope_id, origin, "Rebuild trigger debounced.");

			return;
		}

		let Some(_guard) = self.rebuild.try_dispatch() else {
			tracing::debug!(
				scope_id,
				origin,
				lock_id = REBUILD_LOCK_ID,
				"Rebuild dispatch lock busy; another dispatch is in flight."
			);

			return;
		};

		tracing::info!(
			scope_id,
			origin,
			lock_id = REBUILD_LOCK_ID,
			"Empty cache detected on a structural miss; dispatching rebuild."
		);

		let notifiers = self.notifiers.clone();
		let scope_id = scope_id.to_string();

		tokio::spawn(async move {
			notify::dispatch_chain(&notifiers, &scope_id, origin).await;
		});
	}
}
