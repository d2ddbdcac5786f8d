use serde::{Deserialize, Serialize};

use crate::{Error, Result, RolodexService};
use rolodex_domain::{CacheEntry, EntityKind, SourceEntity, VectorNorm, vector_similarity};

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchRequest {
	pub vector: Vec<f32>,
	pub kind: EntityKind,
	pub field_name: String,
	pub provider_id: String,
	pub model: String,
	#[serde(default)]
	pub min_similarity: Option<f32>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchMatch {
	pub kind: EntityKind,
	pub score: f32,
	pub record: SourceEntity,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchResponse {
	pub matches: Vec<SearchMatch>,
}

struct Scored {
	score: f32,
	entry: CacheEntry,
}

impl RolodexService {
	/// Vector retrieval: joins the external vector index to visible cache
	/// entries of the kind. An empty result is a legitimate semantic
	/// outcome, so SEARCH never evaluates self-healing.
	pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
		if request.vector.is_empty() {
			return Err(Error::InvalidRequest { message: "vector must be non-empty.".to_string() });
		}
		if request.vector.iter().any(|value| !value.is_finite()) {
			return Err(Error::InvalidRequest {
				message: "vector must contain only finite values.".to_string(),
			});
		}
		if request.field_name.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "field_name must be non-empty.".to_string(),
			});
		}
		if request.provider_id.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "provider_id must be non-empty.".to_string(),
			});
		}

		let min_similarity =
			request.min_similarity.unwrap_or(self.cfg.query.search_min_similarity);

		if !min_similarity.is_finite() {
			return Err(Error::InvalidRequest {
				message: "min_similarity must be a finite number.".to_string(),
			});
		}

		let limit = request.limit.unwrap_or(self.cfg.query.search_limit);

		if limit == 0 {
			return Err(Error::InvalidRequest {
				message: "limit must be greater than zero.".to_string(),
			});
		}

		let norm = self.provider_norm(&request.provider_id);
		let vectors = self
			.vectors
			.vectors_for(&request.field_name, &request.provider_id, &request.model)
			.await?;
		let mut scored = Vec::new();

		for vector in vectors {
			let Some(entry) = self.cache.get_by_entity(vector.entity_id) else { continue };

			if entry.kind != request.kind || !entry.visible_to(request.owner_id.as_deref()) {
				continue;
			}

			let Some(score) = vector_similarity(norm, &request.vector, &vector.vec) else {
				tracing::warn!(
					entity_id = %vector.entity_id,
					field_name = %vector.field_name,
					expected = request.vector.len(),
					actual = vector.vec.len(),
					"Skipping embedding with mismatched dimensions."
				);

				continue;
			};

			if score >= min_similarity {
				scored.push(Scored { score, entry });
			}
		}

		scored.sort_by(|a, b| {
			b.score
				.total_cmp(&a.score)
				.then_with(|| a.entry.natural_key.cmp(&b.entry.natural_key))
		});
		scored.truncate(limit as usize);

		let mut matches = Vec::with_capacity(scored.len());

		for Scored { score, entry } in scored {
			let repository = self.registry.repository(entry.kind)?;
			let Some(record) = repository.get(entry.entity_id).await? else {
				tracing::debug!(
					natural_key = %entry.natural_key,
					"Skipping search candidate without a source record."
				);

				continue;
			};

			matches.push(SearchMatch { kind: entry.kind, score, record });
		}

		Ok(SearchResponse { matches })
	}

	/// Similarity must follow the normalization convention of the provider
	/// that produced the vectors; cosine is the default for unlisted
	/// providers.
	fn provider_norm(&self, provider_id: &str) -> VectorNorm {
		match self.cfg.search.normalization.get(provider_id).map(String::as_str) {
			Some("dot") => VectorNorm::Dot,
			_ => VectorNorm::Cosine,
		}
	}
}
