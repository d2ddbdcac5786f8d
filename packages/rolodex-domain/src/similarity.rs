use serde::{Deserialize, Serialize};

/// Normalization convention of the provider that produced a vector. Cosine
/// is the safe default; `Dot` is correct only for providers that emit
/// pre-normalized vectors, where it equals cosine without the norm work.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorNorm {
	Cosine,
	Dot,
}

/// Approximate string similarity in `[0, 1]`, case-insensitive.
pub fn fuzzy_score(query: &str, candidate: &str) -> f32 {
	let query = query.trim().to_lowercase();
	let candidate = candidate.trim().to_lowercase();

	if query.is_empty() || candidate.is_empty() {
		return 0.0;
	}

	strsim::sorensen_dice(&query, &candidate) as f32
}

/// Similarity between a query vector and a stored vector under the given
/// normalization convention. `None` when the dimensions disagree or a norm
/// degenerates to zero.
pub fn vector_similarity(norm: VectorNorm, query: &[f32], stored: &[f32]) -> Option<f32> {
	if query.len() != stored.len() || query.is_empty() {
		return None;
	}

	let dot = query.iter().zip(stored).map(|(a, b)| a * b).sum::<f32>();

	match norm {
		VectorNorm::Dot => Some(dot),
		VectorNorm::Cosine => {
			let query_norm = query.iter().map(|a| a * a).sum::<f32>().sqrt();
			let stored_norm = stored.iter().map(|b| b * b).sum::<f32>().sqrt();

			if query_norm == 0.0 || stored_norm == 0.0 {
				return None;
			}

			Some(dot / (query_norm * stored_norm))
		},
	}
}
