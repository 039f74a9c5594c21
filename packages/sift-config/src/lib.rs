mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Pipeline, Postgres, Providers,
	ResultCache, Service, Storage,
};

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
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::validation("storage.postgres.dsn must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::validation(
			"storage.postgres.pool_max_conns must be greater than zero.",
		));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::validation(
			"providers.embedding.dimensions must be greater than zero.",
		));
	}

	validate_clustering(cfg.pipeline.epsilon, cfg.pipeline.min_points)?;

	if cfg.pipeline.max_content_chars == 0 {
		return Err(Error::validation("pipeline.max_content_chars must be greater than zero."));
	}
	if cfg.pipeline.max_items == 0 {
		return Err(Error::validation("pipeline.max_items must be greater than zero."));
	}
	if cfg.pipeline.concurrency == 0 {
		return Err(Error::validation("pipeline.concurrency must be greater than zero."));
	}
	if cfg.pipeline.result_cache.ttl_days <= 0 {
		return Err(Error::validation(
			"pipeline.result_cache.ttl_days must be greater than zero.",
		));
	}

	if let Some(max) = cfg.pipeline.result_cache.max_payload_bytes
		&& max == 0
	{
		return Err(Error::validation(
			"pipeline.result_cache.max_payload_bytes must be greater than zero.",
		));
	}

	let temperature = cfg.providers.llm.temperature;

	if !temperature.is_finite() {
		return Err(Error::validation("providers.llm.temperature must be a finite number."));
	}
	if !(0.0..=2.0).contains(&temperature) {
		return Err(Error::validation("providers.llm.temperature must be in the range 0.0-2.0."));
	}

	for (label, key, timeout_ms) in [
		("embedding", &cfg.providers.embedding.api_key, cfg.providers.embedding.timeout_ms),
		("llm", &cfg.providers.llm.api_key, cfg.providers.llm.timeout_ms),
	] {
		if key.trim().is_empty() {
			return Err(Error::validation(format!("Provider {label} api_key must be non-empty.")));
		}
		if timeout_ms == 0 {
			return Err(Error::validation(format!(
				"Provider {label} timeout_ms must be greater than zero."
			)));
		}
	}

	Ok(())
}

/// Checks DBSCAN parameters, whether they come from the config file or a request override.
pub fn validate_clustering(epsilon: f32, min_points: usize) -> Result<()> {
	if !epsilon.is_finite() {
		return Err(Error::validation("pipeline.epsilon must be a finite number."));
	}
	if epsilon <= 0.0 {
		return Err(Error::validation("pipeline.epsilon must be greater than zero."));
	}
	if min_points == 0 {
		return Err(Error::validation("pipeline.min_points must be at least one."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in [&mut cfg.providers.embedding.api_base, &mut cfg.providers.llm.api_base] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}

	cfg.service.log_level = cfg.service.log_level.trim().to_string();
}
