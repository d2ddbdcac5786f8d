use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub query: Query,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub rebuild: Rebuild,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Query {
	pub fuzzy_threshold: f32,
	pub fuzzy_limit: u32,
	pub fuzzy_match_summary: bool,
	pub search_min_similarity: f32,
	pub search_limit: u32,
	pub traverse_max_depth: u32,
}
impl Default for Query {
	fn default() -> Self {
		Self {
			fuzzy_threshold: 0.3,
			fuzzy_limit: 10,
			fuzzy_match_summary: true,
			search_min_similarity: 0.7,
			search_limit: 10,
			traverse_max_depth: 6,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct Search {
	/// Map of embedding provider id to its normalization convention,
	/// `"cosine"` or `"dot"`. Providers not listed here default to cosine.
	#[serde(default)]
	pub normalization: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Rebuild {
	pub debounce_window_secs: u64,
	pub scoped: bool,
	pub remote_url: Option<String>,
}
impl Default for Rebuild {
	fn default() -> Self {
		Self { debounce_window_secs: 30, scoped: true, remote_url: None }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub rebuild_secret: String,
	#[serde(default = "default_bind_localhost_only")]
	pub bind_localhost_only: bool,
}

fn default_bind_localhost_only() -> bool {
	true
}
