use serde::{Deserialize, Serialize};

use crate::{Error, Result, RolodexService};
use rolodex_domain::{EntityKind, SourceEntity};

#[derive(Debug, Deserialize, Serialize)]
pub struct LookupRequest {
	pub natural_key: String,
	pub scope_id: String,
	#[serde(default)]
	pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LookupResponse {
	pub kind: EntityKind,
	pub record: SourceEntity,
}

impl RolodexService {
	/// Exact retrieval by natural key: one indexed read, then hydration of
	/// the authoritative record from the source tables.
	pub async fn lookup(&self, request: LookupRequest) -> Result<LookupResponse> {
		if request.natural_key.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "natural_key must be non-empty.".to_string(),
			});
		}
		if request.scope_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "scope_id must be non-empty.".to_string() });
		}

		let Some(entry) =
			self.cache.get(&request.scope_id, &request.natural_key, request.owner_id.as_deref())
		else {
			self.evaluate_self_heal(&request.scope_id, "lookup");

			return Err(not_found(&request));
		};
		let repository = self.registry.repository(entry.kind)?;
		let Some(record) = repository.get(entry.entity_id).await? else {
			// The entry outlived its source row; repair the index and miss.
			tracing::warn!(
				scope_id = %request.scope_id,
				natural_key = %request.natural_key,
				entity_id = %entry.entity_id,
				"Dropping stale cache entry without a source record."
			);
			self.cache.delete(entry.entity_id);
			self.evaluate_self_heal(&request.scope_id, "lookup");

			return Err(not_found(&request));
		};

		Ok(LookupResponse { kind: entry.kind, record })
	}
}

fn not_found(request: &LookupRequest) -> Error {
	Error::NotFound {
		message: format!(
			"No entity with key {} in scope {}.",
			request.natural_key, request.scope_id
		),
	}
}
