mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Query, Rebuild, Search, Security, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if !cfg.query.fuzzy_threshold.is_finite() || !(0.0..=1.0).contains(&cfg.query.fuzzy_threshold)
	{
		return Err(Error::Validation {
			message: "query.fuzzy_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.query.fuzzy_limit == 0 {
		return Err(Error::Validation {
			message: "query.fuzzy_limit must be greater than zero.".to_string(),
		});
	}
	if !cfg.query.search_min_similarity.is_finite()
		|| !(-1.0..=1.0).contains(&cfg.query.search_min_similarity)
	{
		return Err(Error::Validation {
			message: "query.search_min_similarity must be in the range -1.0-1.0.".to_string(),
		});
	}
	if cfg.query.search_limit == 0 {
		return Err(Error::Validation {
			message: "query.search_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.query.traverse_max_depth == 0 {
		return Err(Error::Validation {
			message: "query.traverse_max_depth must be greater than zero.".to_string(),
		});
	}

	for (provider_id, norm) in &cfg.search.normalization {
		if !matches!(norm.as_str(), "cosine" | "dot") {
			return Err(Error::Validation {
				message: format!(
					"search.normalization.{provider_id} must be one of cosine or dot."
				),
			});
		}
	}

	if cfg.rebuild.debounce_window_secs == 0 {
		return Err(Error::Validation {
			message: "rebuild.debounce_window_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.security.rebuild_secret.trim().is_empty() {
		return Err(Error::Validation {
			message: "security.rebuild_secret must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.rebuild.remote_url.as_deref().map(|url| url.trim().is_empty()).unwrap_or(false) {
		cfg.rebuild.remote_url = None;
	}
}
