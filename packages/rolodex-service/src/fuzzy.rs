use serde::{Deserialize, Serialize};

use crate::{Error, Result, RolodexService};
use rolodex_domain::{CacheEntry, EntityKind, SourceEntity, fuzzy_score};

#[derive(Debug, Deserialize, Serialize)]
pub struct FuzzyRequest {
	pub text: String,
	pub scope_id: String,
	#[serde(default)]
	pub threshold: Option<f32>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FuzzyMatch {
	pub kind: EntityKind,
	pub score: f32,
	pub record: SourceEntity,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FuzzyResponse {
	pub matches: Vec<FuzzyMatch>,
}

struct Scored {
	score: f32,
	entry: CacheEntry,
}

impl RolodexService {
	/// Approximate text retrieval over natural keys (and summary text when
	/// configured). The threshold is a hard cutoff; only the top-K survivors
	/// are hydrated to full records.
	pub async fn fuzzy(&self, request: FuzzyRequest) -> Result<FuzzyResponse> {
		if request.text.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "text must be non-empty.".to_string() });
		}
		if request.scope_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "scope_id must be non-empty.".to_string() });
		}

		let threshold = request.threshold.unwrap_or(self.cfg.query.fuzzy_threshold);

		if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
			return Err(Error::InvalidRequest {
				message: "threshold must be in the range 0.0-1.0.".to_string(),
			});
		}

		let limit = request.limit.unwrap_or(self.cfg.query.fuzzy_limit);

		if limit == 0 {
			return Err(Error::InvalidRequest {
				message: "limit must be greater than zero.".to_string(),
			});
		}

		let candidates =
			self.cache.visible_in_scope(&request.scope_id, request.owner_id.as_deref());
		let mut scored = candidates
			.into_iter()
			.filter_map(|entry| {
				let mut score = fuzzy_score(&request.text, &entry.natural_key);

				if self.cfg.query.fuzzy_match_summary {
					score = score.max(fuzzy_score(&request.text, &entry.summary_text));
				}

				(score >= threshold).then_some(Scored { score, entry })
			})
			.collect::<Vec<_>>();

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
					"Skipping fuzzy candidate without a source record."
				);

				continue;
			};

			matches.push(FuzzyMatch { kind: entry.kind, score, record });
		}

		if matches.is_empty() {
			self.evaluate_self_heal(&request.scope_id, "fuzzy");
		}

		Ok(FuzzyResponse { matches })
	}
}
