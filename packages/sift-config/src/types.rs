use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Knobs for one clustering run. Request-level overrides win over `epsilon` and `min_points`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	/// Inclusive Euclidean neighbor radius.
	pub epsilon: f32,
	/// Neighbors (excluding the point itself) required for a core point.
	pub min_points: usize,
	/// Content excerpt cap, in characters, for description prompts.
	pub max_content_chars: usize,
	pub max_items: usize,
	/// In-flight backend calls per stage.
	pub concurrency: usize,
	pub result_cache: ResultCache,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self {
			epsilon: 0.75,
			min_points: 2,
			max_content_chars: 4_000,
			max_items: 100,
			concurrency: 4,
			result_cache: ResultCache::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultCache {
	pub enabled: bool,
	pub ttl_days: i64,
	pub max_payload_bytes: Option<u64>,
}
impl Default for ResultCache {
	fn default() -> Self {
		Self { enabled: true, ttl_days: 7, max_payload_bytes: Some(262_144) }
	}
}
