use serde_json::Value;
use time::OffsetDateTime;

/// Cached description and embedding for one URL. An empty `embedding` means not yet embedded.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PageRecord {
	pub url: String,
	pub title: String,
	pub description: String,
	pub embedding: Vec<f32>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ClusterResultRow {
	pub cache_key: String,
	pub payload: Value,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
	pub hit_count: i64,
}
