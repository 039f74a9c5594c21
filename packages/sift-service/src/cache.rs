use serde::{Deserialize, Serialize};
use serde_json::Value;

use sift_config::Config;
use sift_domain::{ClusterSummary, dbscan::DbscanParams};

use crate::{Error, Result, SourceSpec};

pub const RESULT_CACHE_SCHEMA_VERSION: i32 = 1;
const CACHE_KEY_PREFIX_CHARS: usize = 12;

/// What the result cache stores for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCachePayload {
	pub summaries: Vec<ClusterSummary>,
}

/// Key for a whole clustering run.
///
/// Identical inputs and parameters map to the same key. Item content is folded in as a digest so
/// the key payload stays small for large inputs.
pub fn build_result_cache_key(
	source: &SourceSpec,
	params: DbscanParams,
	cfg: &Config,
) -> Result<String> {
	let embedding = &cfg.providers.embedding;
	let llm = &cfg.providers.llm;
	let payload = serde_json::json!({
		"kind": "cluster_result",
		"schema_version": RESULT_CACHE_SCHEMA_VERSION,
		"source": normalized_source(source),
		"epsilon": params.epsilon,
		"min_points": params.min_points,
		"max_items": cfg.pipeline.max_items,
		"max_content_chars": cfg.pipeline.max_content_chars,
		"embedding_model": format!(
			"{}:{}:{}",
			embedding.provider_id, embedding.model, embedding.dimensions
		),
		"llm_model": format!("{}:{}", llm.provider_id, llm.model),
	});

	hash_cache_key(&payload)
}

pub fn hash_cache_key(payload: &Value) -> Result<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| Error::InvalidRequest {
		message: format!("Failed to encode cache key payload: {err}."),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub fn cache_key_prefix(key: &str) -> &str {
	let end = key.len().min(CACHE_KEY_PREFIX_CHARS);

	key.get(..end).unwrap_or(key)
}

fn normalized_source(source: &SourceSpec) -> Value {
	match source {
		SourceSpec::Items { items } => {
			let items: Vec<Value> = items
				.iter()
				.map(|item| {
					serde_json::json!({
						"url": item.url.trim(),
						"title": item.title,
						"content": blake3::hash(item.content.as_bytes()).to_hex().to_string(),
					})
				})
				.collect();

			serde_json::json!({ "kind": "items", "items": items })
		},
		SourceSpec::Acquire(spec) => {
			let urls: Vec<&str> = spec.urls.iter().map(|url| url.trim()).collect();

			serde_json::json!({
				"kind": "acquire",
				"fetch_history": spec.fetch_history,
				"max_items": spec.max_items,
				"urls": urls,
				"base_url": spec.base_url.as_deref().map(str::trim),
			})
		},
	}
}
