use std::sync::{PoisonError, RwLock};

use ahash::AHashMap;
use uuid::Uuid;

use rolodex_domain::CacheEntry;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct EntryKey {
	scope_id: String,
	natural_key: String,
}

#[derive(Default)]
struct CacheIndex {
	by_key: AHashMap<EntryKey, CacheEntry>,
	by_entity: AHashMap<Uuid, EntryKey>,
	scope_counts: AHashMap<String, usize>,
}
impl CacheIndex {
	fn remove_key(&mut self, key: &EntryKey) -> Option<CacheEntry> {
		let entry = self.by_key.remove(key)?;

		self.by_entity.remove(&entry.entity_id);

		if let Some(count) = self.scope_counts.get_mut(&key.scope_id) {
			*count -= 1;

			if *count == 0 {
				self.scope_counts.remove(&key.scope_id);
			}
		}

		Some(entry)
	}

	fn insert(&mut self, entry: CacheEntry) {
		let key = EntryKey {
			scope_id: entry.scope_id.clone(),
			natural_key: entry.natural_key.clone(),
		};

		// An entry already cached for this entity under another key would go
		// stale after a key rename; an entry holding this key for another
		// entity would leave a dangling back-reference. Drop both.
		if let Some(previous_key) = self.by_entity.get(&entry.entity_id).cloned()
			&& previous_key != key
		{
			self.remove_key(&previous_key);
		}
		if let Some(occupant) = self.by_key.get(&key)
			&& occupant.entity_id != entry.entity_id
		{
			self.by_entity.remove(&occupant.entity_id);
		}

		if !self.by_key.contains_key(&key) {
			*self.scope_counts.entry(key.scope_id.clone()).or_insert(0) += 1;
		}

		self.by_entity.insert(entry.entity_id, key.clone());
		self.by_key.insert(key, entry);
	}
}

/// The non-durable keyed index every retrieval algorithm reads.
///
/// Wiped by restart or replica promotion by design; the Rebuild Executor
/// repopulates it from the source tables.
#[derive(Default)]
pub struct CacheStore {
	inner: RwLock<CacheIndex>,
}
impl CacheStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Idempotent replace by `(scope_id, natural_key)`.
	pub fn upsert(&self, entry: CacheEntry) {
		let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

		inner.insert(entry);
	}

	pub fn delete(&self, entity_id: Uuid) -> bool {
		let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
		let Some(key) = inner.by_entity.get(&entity_id).cloned() else { return false };

		inner.remove_key(&key).is_some()
	}

	pub fn get(
		&self,
		scope_id: &str,
		natural_key: &str,
		owner_id: Option<&str>,
	) -> Option<CacheEntry> {
		let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
		let key = EntryKey {
			scope_id: scope_id.to_string(),
			natural_key: natural_key.to_string(),
		};

		inner.by_key.get(&key).filter(|entry| entry.visible_to(owner_id)).cloned()
	}

	pub fn get_by_entity(&self, entity_id: Uuid) -> Option<CacheEntry> {
		let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
		let key = inner.by_entity.get(&entity_id)?;

		inner.by_key.get(key).cloned()
	}

	/// O(1) existence probe backed by per-scope counters, not a scan.
	pub fn is_empty(&self, scope_id: &str) -> bool {
		let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

		!inner.scope_counts.contains_key(scope_id)
	}

	pub fn visible_in_scope(&self, scope_id: &str, owner_id: Option<&str>) -> Vec<CacheEntry> {
		let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

		inner
			.by_key
			.iter()
			.filter(|(key, entry)| key.scope_id == scope_id && entry.visible_to(owner_id))
			.map(|(_, entry)| entry.clone())
			.collect()
	}

	pub fn clear_scope(&self, scope_id: &str) {
		let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
		let keys = inner
			.by_key
			.keys()
			.filter(|key| key.scope_id == scope_id)
			.cloned()
			.collect::<Vec<_>>();

		for key in keys {
			inner.remove_key(&key);
		}
	}

	pub fn clear(&self) {
		let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

		inner.by_key.clear();
		inner.by_entity.clear();
		inner.scope_counts.clear();
	}

	pub fn entry_count(&self) -> usize {
		let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

		inner.by_key.len()
	}

	/// All entries ordered by `(scope_id, natural_key)`.
	pub fn entries(&self) -> Vec<CacheEntry> {
		let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
		let mut entries = inner.by_key.values().cloned().collect::<Vec<_>>();

		entries.sort_by(|a, b| {
			(a.scope_id.as_str(), a.natural_key.as_str())
				.cmp(&(b.scope_id.as_str(), b.natural_key.as_str()))
		});

		entries
	}
}
