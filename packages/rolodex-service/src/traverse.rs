use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, RolodexService};
use rolodex_domain::{EntityEdge, EntityKind};

#[derive(Debug, Deserialize, Serialize)]
pub struct TraverseRequest {
	pub natural_key: String,
	pub scope_id: String,
	#[serde(default)]
	pub owner_id: Option<String>,
	#[serde(default)]
	pub max_depth: Option<u32>,
	#[serde(default)]
	pub rel_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TraverseNode {
	pub depth: u32,
	pub natural_key: String,
	pub kind: EntityKind,
	pub rel_type: String,
	pub weight: f32,
	/// Natural keys from the start to this node, used for per-path cycle
	/// prevention.
	pub path: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TraverseResponse {
	pub nodes: Vec<TraverseNode>,
}

struct Frontier {
	depth: u32,
	path: Vec<String>,
	edges: Vec<EntityEdge>,
}

impl RolodexService {
	/// Breadth-first expansion along denormalized edges, resolved per hop by
	/// natural key within the scope. Dangling edges are dead ends, not
	/// errors.
	pub async fn traverse(&self, request: TraverseRequest) -> Result<TraverseResponse> {
		if request.natural_key.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "natural_key must be non-empty.".to_string(),
			});
		}
		if request.scope_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "scope_id must be non-empty.".to_string() });
		}

		let max_depth = request.max_depth.unwrap_or(1);

		if max_depth == 0 || max_depth > self.cfg.query.traverse_max_depth {
			return Err(Error::InvalidRequest {
				message: format!(
					"max_depth must be between 1 and {}.",
					self.cfg.query.traverse_max_depth
				),
			});
		}

		let owner_id = request.owner_id.as_deref();
		let Some(start) = self.cache.get(&request.scope_id, &request.natural_key, owner_id)
		else {
			self.evaluate_self_heal(&request.scope_id, "traverse");

			return Err(Error::NotFound {
				message: format!(
					"No entity with key {} in scope {}.",
					request.natural_key, request.scope_id
				),
			});
		};
		let allowed = request
			.rel_types
			.as_ref()
			.map(|types| types.iter().map(String::as_str).collect::<HashSet<_>>());
		let mut discovered = Vec::new();
		let mut queue = VecDeque::from([Frontier {
			depth: 0,
			path: vec![start.natural_key],
			edges: start.edges,
		}]);

		while let Some(frontier) = queue.pop_front() {
			if frontier.depth >= max_depth {
				continue;
			}

			for edge in &frontier.edges {
				if let Some(allowed) = &allowed
					&& !allowed.contains(edge.rel_type.as_str())
				{
					continue;
				}
				// Per-path cycle prevention: the same node may be reached via
				// different paths, never twice within one path.
				if frontier.path.iter().any(|visited| visited == &edge.dst_key) {
					continue;
				}

				let Some(target) = self.cache.get(&request.scope_id, &edge.dst_key, owner_id)
				else {
					continue;
				};
				let mut path = frontier.path.clone();

				path.push(target.natural_key.clone());

				discovered.push(TraverseNode {
					depth: frontier.depth + 1,
					natural_key: target.natural_key.clone(),
					kind: target.kind,
					rel_type: edge.rel_type.clone(),
					weight: edge.weight,
					path: path.clone(),
				});
				queue.push_back(Frontier {
					depth: frontier.depth + 1,
					path,
					edges: target.edges,
				});
			}
		}

		// BFS discovery order makes first-seen the shallowest occurrence.
		let mut seen = HashSet::new();
		let nodes = discovered
			.into_iter()
			.filter(|node| seen.insert(node.natural_key.clone()))
			.collect();

		Ok(TraverseResponse { nodes })
	}
}
