use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::{BoxFuture, Result};
use rolodex_domain::EmbeddingVector;

/// External vector index, consumed only by SEARCH. Embedding generation is
/// out of scope; this system reads whatever the pipeline produced.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn vectors_for<'a>(
		&'a self,
		field_name: &'a str,
		provider_id: &'a str,
		model: &'a str,
	) -> BoxFuture<'a, Result<Vec<EmbeddingVector>>>;
}

/// Process-local vector index stand-in.
#[derive(Default)]
pub struct MemoryVectorIndex {
	rows: RwLock<Vec<EmbeddingVector>>,
}
impl MemoryVectorIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace by the `(entity_id, field_name, provider_id, model)` unique
	/// key.
	pub fn put(&self, vector: EmbeddingVector) {
		let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);

		rows.retain(|row| {
			row.entity_id != vector.entity_id
				|| row.field_name != vector.field_name
				|| row.provider_id != vector.provider_id
				|| row.model != vector.model
		});
		rows.push(vector);
	}

	pub fn remove_entity(&self, entity_id: Uuid) {
		let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);

		rows.retain(|row| row.entity_id != entity_id);
	}
}
impl VectorIndex for MemoryVectorIndex {
	fn vectors_for<'a>(
		&'a self,
		field_name: &'a str,
		provider_id: &'a str,
		model: &'a str,
	) -> BoxFuture<'a, Result<Vec<EmbeddingVector>>> {
		let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
		let matching = rows
			.iter()
			.filter(|row| {
				row.field_name == field_name
					&& row.provider_id == provider_id
					&& row.model == model
			})
			.cloned()
			.collect::<Vec<_>>();

		Box::pin(async move { Ok(matching) })
	}
}
