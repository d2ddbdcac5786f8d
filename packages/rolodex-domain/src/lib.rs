pub mod entity;
pub mod projection;
pub mod similarity;
pub mod time_serde;

pub use entity::{
	CacheEntry, EmbeddingVector, EntityEdge, EntityKind, RebuildState, SourceEntity,
};
pub use projection::{ProjectionError, project};
pub use similarity::{VectorNorm, fuzzy_score, vector_similarity};
