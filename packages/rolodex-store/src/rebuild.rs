use std::sync::{
	Mutex, MutexGuard, TryLockError,
	atomic::{AtomicI64, AtomicU64, Ordering},
};

use time::OffsetDateTime;

use rolodex_domain::RebuildState;

const NEVER: i64 = 0;

/// The RebuildState singleton plus the coordinator's try-lock.
///
/// Timestamps and counters are atomics so metrics readers never block the
/// Coordinator or the Executor; writers contend only on the dispatch mutex,
/// and only via `try_lock`.
#[derive(Debug, Default)]
pub struct RebuildTracker {
	last_trigger_unix: AtomicI64,
	last_rebuild_unix: AtomicI64,
	trigger_count: AtomicU64,
	rebuild_count: AtomicU64,
	dispatch_lock: Mutex<()>,
}

pub struct DispatchGuard<'a> {
	_guard: MutexGuard<'a, ()>,
}

impl RebuildTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Debounce gate: admits at most one trigger per window.
	///
	/// The compare-exchange makes the read-check-update atomic, so N
	/// concurrent structural misses admit exactly one caller; the losers see
	/// either the stale-window comparison or a failed exchange.
	pub fn mark_trigger(&self, now: OffsetDateTime, window_secs: u64) -> bool {
		let now_unix = now.unix_timestamp();
		let previous = self.last_trigger_unix.load(Ordering::Acquire);

		if previous != NEVER && now_unix.saturating_sub(previous) < window_secs as i64 {
			return false;
		}
		if self
			.last_trigger_unix
			.compare_exchange(previous, now_unix, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return false;
		}

		self.trigger_count.fetch_add(1, Ordering::Relaxed);

		true
	}

	/// Non-blocking try-lock; `None` means a dispatch is already in flight.
	pub fn try_dispatch(&self) -> Option<DispatchGuard<'_>> {
		match self.dispatch_lock.try_lock() {
			Ok(guard) => Some(DispatchGuard { _guard: guard }),
			Err(TryLockError::Poisoned(poisoned)) =>
				Some(DispatchGuard { _guard: poisoned.into_inner() }),
			Err(TryLockError::WouldBlock) => None,
		}
	}

	pub fn record_rebuild(&self, now: OffsetDateTime) {
		self.last_rebuild_unix.store(now.unix_timestamp(), Ordering::Release);
		self.rebuild_count.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> RebuildState {
		RebuildState {
			last_trigger_at: to_timestamp(self.last_trigger_unix.load(Ordering::Acquire)),
			last_rebuild_at: to_timestamp(self.last_rebuild_unix.load(Ordering::Acquire)),
			trigger_count: self.trigger_count.load(Ordering::Relaxed),
			rebuild_count: self.rebuild_count.load(Ordering::Relaxed),
		}
	}
}

fn to_timestamp(unix: i64) -> Option<OffsetDateTime> {
	if unix == NEVER {
		return None;
	}

	OffsetDateTime::from_unix_timestamp(unix).ok()
}
