pub mod cache;
pub mod describe;
pub mod embed;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod summarize;

mod error;

pub use error::{Error, Result};
pub use pipeline::{AcquireSpec, ClusterRequest, ClusterResponse, RunStats, SourceSpec};
pub use sift_domain::{ClusterSummary, ClusteredItem, ContentItem, EmbeddedItem, NOISE};
pub use sift_storage::models::PageRecord;
pub use source::EmptySource;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use sift_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use sift_providers::{HttpClient, completion, embedding};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

/// Shared, persistent store for per-URL descriptions and embeddings plus whole-run results.
///
/// Writes are upserts keyed by URL or cache key; concurrent writers resolve as last writer wins.
pub trait CacheStore
where
	Self: Send + Sync,
{
	fn fetch_pages<'a>(&'a self, urls: &'a [String]) -> BoxFuture<'a, Result<Vec<PageRecord>>>;

	fn upsert_pages<'a>(
		&'a self,
		records: &'a [PageRecord],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;

	fn fetch_result<'a>(
		&'a self,
		cache_key: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Value>>>;

	fn store_result<'a>(
		&'a self,
		cache_key: &'a str,
		payload: &'a Value,
		now: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;
}

/// Crawler or history reader producing `{url, title, content}` records.
pub trait ContentSource
where
	Self: Send + Sync,
{
	fn acquire<'a>(&'a self, spec: &'a AcquireSpec) -> BoxFuture<'a, Result<Vec<ContentItem>>>;
}

/// Per-stage counters. `skipped` counts items a stage passed over without a backend call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
	pub cache_hits: usize,
	pub generated: usize,
	pub skipped: usize,
	pub failed: usize,
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}

	/// OpenAI-compatible HTTP backends sharing one client.
	pub fn http(http: HttpClient) -> Self {
		let provider = Arc::new(HttpProviders { http });

		Self { embedding: provider.clone(), completion: provider }
	}
}

pub struct SiftService {
	pub cfg: Config,
	pub store: Arc<dyn CacheStore>,
	pub source: Arc<dyn ContentSource>,
	pub providers: Providers,
}
impl SiftService {
	pub fn new(cfg: Config, store: Arc<dyn CacheStore>, providers: Providers) -> Self {
		Self { cfg, store, source: Arc::new(EmptySource), providers }
	}

	pub fn with_source(mut self, source: Arc<dyn ContentSource>) -> Self {
		self.source = source;

		self
	}

	pub(crate) async fn complete(&self, messages: &[Value]) -> Result<String> {
		let cfg = &self.cfg.providers.llm;
		let call = self.providers.completion.complete(cfg, messages);

		bounded(call_budget(cfg.timeout_ms), call).await.unwrap_or_else(|| {
			Err(Error::Provider {
				message: format!("Completion call exceeded {} ms.", call_budget(cfg.timeout_ms)),
			})
		})
	}

	pub(crate) async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let texts = [text.to_string()];
		let call = self.providers.embedding.embed(cfg, &texts);
		let vectors = bounded(call_budget(cfg.timeout_ms), call).await.unwrap_or_else(|| {
			Err(Error::Provider {
				message: format!("Embedding call exceeded {} ms.", call_budget(cfg.timeout_ms)),
			})
		})?;

		vectors.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})
	}

	/// Batch lookup that degrades to an empty result when the store is unavailable.
	pub(crate) async fn lookup_pages(&self, urls: &[String], stage: &str) -> Vec<PageRecord> {
		match self.store.fetch_pages(urls).await {
			Ok(records) => records,
			Err(err) => {
				tracing::warn!(error = %err, stage, "Page cache read failed; recomputing.");

				Vec::new()
			},
		}
	}

	pub(crate) async fn persist_pages(&self, records: &[PageRecord], stage: &str) {
		if records.is_empty() {
			return;
		}
		if let Err(err) = self.store.upsert_pages(records, OffsetDateTime::now_utc()).await {
			tracing::warn!(
				error = %err,
				stage,
				records = records.len(),
				"Page cache write failed."
			);
		}
	}
}

struct HttpProviders {
	http: HttpClient,
}

impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(&self.http, cfg, texts).await?) })
	}
}

impl CompletionProvider for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(completion::complete(&self.http, cfg, messages).await?) })
	}
}

// The HTTP client retries a completion once, so the outer bound covers two requests.
fn call_budget(timeout_ms: u64) -> u64 {
	timeout_ms.saturating_mul(2)
}

async fn bounded<F, T>(budget_ms: u64, call: F) -> Option<T>
where
	F: Future<Output = T>,
{
	tokio::time::timeout(Duration::from_millis(budget_ms), call).await.ok()
}
