use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use sift_domain::{
	ClusterSummary, ContentItem,
	dbscan::{self, DbscanParams},
	dedupe,
};

use crate::{
	Error, Result, SiftService, StageReport,
	cache::{self, ResultCachePayload},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
	pub source: SourceSpec,
	/// Overrides `pipeline.epsilon`.
	#[serde(default)]
	pub epsilon: Option<f32>,
	/// Overrides `pipeline.min_points`.
	#[serde(default)]
	pub min_points: Option<usize>,
	/// Skip the result cache read and overwrite whatever is stored for this input.
	#[serde(default)]
	pub refresh: bool,
}
impl ClusterRequest {
	pub fn from_items(items: Vec<ContentItem>) -> Self {
		Self { source: SourceSpec::Items { items }, epsilon: None, min_points: None, refresh: false }
	}
}

/// Where the items come from: supplied inline, or produced by the configured content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
	Items { items: Vec<ContentItem> },
	Acquire(AcquireSpec),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquireSpec {
	#[serde(default)]
	pub fetch_history: bool,
	#[serde(default)]
	pub max_items: Option<usize>,
	#[serde(default)]
	pub urls: Vec<String>,
	#[serde(default)]
	pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResponse {
	pub summaries: Vec<ClusterSummary>,
	/// True when the summaries came from the result cache.
	pub cached: bool,
	pub stats: RunStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
	pub acquired: usize,
	pub unique: usize,
	pub described: StageReport,
	pub embedded: StageReport,
	pub summarized: StageReport,
	pub clusters: usize,
	pub noise: usize,
}
impl RunStats {
	/// True when any stage lost an item or a label to a backend failure.
	pub fn is_degraded(&self) -> bool {
		self.described.failed > 0 || self.embedded.failed > 0 || self.summarized.failed > 0
	}
}

impl SiftService {
	/// Acquire, dedupe, describe, embed, cluster, and summarize, consulting the result cache first.
	///
	/// Stage failures degrade the result instead of failing the run. Errors are reserved for
	/// malformed requests, inconsistent embedding dimensions, and similar input faults.
	pub async fn cluster(&self, req: ClusterRequest) -> Result<ClusterResponse> {
		validate_request(&req)?;

		let params = self.resolve_params(&req)?;
		let cache_cfg = &self.cfg.pipeline.result_cache;
		let cache_key = if cache_cfg.enabled {
			Some(cache::build_result_cache_key(&req.source, params, &self.cfg)?)
		} else {
			None
		};

		if let Some(key) = cache_key.as_deref()
			&& !req.refresh
			&& let Some(summaries) = self.read_cached_result(key).await
		{
			return Ok(ClusterResponse { summaries, cached: true, stats: RunStats::default() });
		}

		let (summaries, stats) = self.run(req.source, params).await?;

		if let Some(key) = cache_key.as_deref() {
			if stats.is_degraded() || summaries.is_empty() {
				tracing::info!(
					cache_key_prefix = cache::cache_key_prefix(key),
					degraded = stats.is_degraded(),
					"Result not cached."
				);
			} else {
				self.write_cached_result(key, &summaries).await;
			}
		}

		Ok(ClusterResponse { summaries, cached: false, stats })
	}

	fn resolve_params(&self, req: &ClusterRequest) -> Result<DbscanParams> {
		let epsilon = req.epsilon.unwrap_or(self.cfg.pipeline.epsilon);
		let min_points = req.min_points.unwrap_or(self.cfg.pipeline.min_points);

		sift_config::validate_clustering(epsilon, min_points)?;

		let params = DbscanParams::new(epsilon, min_points);

		params.validate()?;

		Ok(params)
	}

	async fn run(
		&self,
		source: SourceSpec,
		params: DbscanParams,
	) -> Result<(Vec<ClusterSummary>, RunStats)> {
		let mut stats = RunStats::default();
		let mut items = self.acquire(source).await;

		stats.acquired = items.len();

		// URLs key dedupe, the page cache, and the result-cache key alike.
		for item in &mut items {
			let trimmed = item.url.trim();

			if trimmed.len() != item.url.len() {
				item.url = trimmed.to_string();
			}
		}

		let mut items = dedupe::dedupe_by_url(items);
		let max_items = self.cfg.pipeline.max_items;

		if items.len() > max_items {
			tracing::info!(unique = items.len(), max_items, "Truncating input to max_items.");

			items.truncate(max_items);
		}

		stats.unique = items.len();

		if items.is_empty() {
			return Ok((Vec::new(), stats));
		}

		let (described, report) = self.describe_items(items).await;

		stats.described = report;

		let (embedded, report) = self.embed_items(described).await;

		stats.embedded = report;

		if embedded.is_empty() {
			tracing::info!("No items survived embedding; nothing to cluster.");

			return Ok((Vec::new(), stats));
		}

		let clustered = dbscan::cluster_items(embedded, params)?;

		stats.noise = clustered.iter().filter(|item| item.is_noise()).count();

		let (summaries, report) = self.summarize_clusters(&clustered).await;

		stats.summarized = report;
		stats.clusters = summaries.iter().filter(|summary| !summary.is_noise()).count();

		tracing::info!(
			acquired = stats.acquired,
			unique = stats.unique,
			clusters = stats.clusters,
			noise = stats.noise,
			epsilon = params.epsilon,
			min_points = params.min_points,
			"Clustering run finished."
		);

		Ok((summaries, stats))
	}

	async fn acquire(&self, source: SourceSpec) -> Vec<ContentItem> {
		match source {
			SourceSpec::Items { items } => items,
			SourceSpec::Acquire(mut spec) => {
				spec.urls = spec.urls.iter().map(|url| url.trim().to_string()).collect();
				spec.base_url = spec.base_url.map(|base| base.trim().to_string());

				self.acquire_from_source(&spec).await
			},
		}
	}

	async fn acquire_from_source(&self, spec: &AcquireSpec) -> Vec<ContentItem> {
		match self.source.acquire(spec).await {
			Ok(items) => items,
			Err(err) => {
				tracing::warn!(error = %err, "Content acquisition failed; treating as no input.");

				Vec::new()
			},
		}
	}

	async fn read_cached_result(&self, key: &str) -> Option<Vec<ClusterSummary>> {
		let prefix = cache::cache_key_prefix(key);
		let raw = match self.store.fetch_result(key, OffsetDateTime::now_utc()).await {
			Ok(Some(raw)) => raw,
			Ok(None) => {
				tracing::info!(cache_key_prefix = prefix, "Result cache miss.");

				return None;
			},
			Err(err) => {
				tracing::warn!(error = %err, cache_key_prefix = prefix, "Result cache read failed.");

				return None;
			},
		};

		match serde_json::from_value::<ResultCachePayload>(raw) {
			Ok(payload) => {
				tracing::info!(
					cache_key_prefix = prefix,
					clusters = payload.summaries.len(),
					"Result cache hit."
				);

				Some(payload.summaries)
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = prefix,
					"Result cache payload decode failed; recomputing."
				);

				None
			},
		}
	}

	async fn write_cached_result(&self, key: &str, summaries: &[ClusterSummary]) {
		let cache_cfg = &self.cfg.pipeline.result_cache;
		let prefix = cache::cache_key_prefix(key);
		let payload = ResultCachePayload { summaries: summaries.to_vec() };
		let value = match serde_json::to_value(&payload) {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(error = %err, cache_key_prefix = prefix, "Result encode failed.");

				return;
			},
		};

		if let Some(max) = cache_cfg.max_payload_bytes {
			let size = serde_json::to_vec(&value).map(|raw| raw.len() as u64).unwrap_or(u64::MAX);

			if size > max {
				tracing::warn!(
					cache_key_prefix = prefix,
					payload_bytes = size,
					max_payload_bytes = max,
					"Result exceeds cache payload limit; not cached."
				);

				return;
			}
		}

		let now = OffsetDateTime::now_utc();
		let expires_at = now + Duration::days(cache_cfg.ttl_days);

		match self.store.store_result(key, &value, now, expires_at).await {
			Ok(()) => {
				tracing::info!(cache_key_prefix = prefix, "Result cached.");
			},
			Err(err) => {
				tracing::warn!(error = %err, cache_key_prefix = prefix, "Result cache write failed.");
			},
		}
	}
}

fn validate_request(req: &ClusterRequest) -> Result<()> {
	match &req.source {
		SourceSpec::Items { items } =>
			if let Some(index) = items.iter().position(|item| item.url.trim().is_empty()) {
				return Err(Error::InvalidRequest {
					message: format!("source.items[{index}].url must be non-empty."),
				});
			},
		SourceSpec::Acquire(spec) => {
			if !spec.fetch_history && spec.urls.is_empty() && spec.base_url.is_none() {
				return Err(Error::InvalidRequest {
					message: "source must set fetch_history, urls, or base_url.".to_string(),
				});
			}
			if spec.max_items == Some(0) {
				return Err(Error::InvalidRequest {
					message: "source.max_items must be greater than zero.".to_string(),
				});
			}
			if spec.urls.iter().any(|url| url.trim().is_empty()) {
				return Err(Error::InvalidRequest {
					message: "source.urls must not contain blank entries.".to_string(),
				});
			}
		},
	}

	Ok(())
}
