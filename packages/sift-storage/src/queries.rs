use serde_json::Value;
use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{
	Error, Result,
	db::Db,
	models::{ClusterResultRow, PageRecord},
};

pub async fn fetch_page_records<'e, E>(executor: E, urls: &[String]) -> Result<Vec<PageRecord>>
where
	E: PgExecutor<'e>,
{
	if urls.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, PageRecord>(
		"\
SELECT
\turl,
\ttitle,
\tdescription,
\tembedding
FROM page_cache
WHERE url = ANY($1)",
	)
	.bind(urls)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Writes all records in one transaction. A later write for the same URL overwrites title,
/// description, and embedding.
pub async fn upsert_page_records(
	db: &Db,
	records: &[PageRecord],
	now: OffsetDateTime,
) -> Result<()> {
	if records.is_empty() {
		return Ok(());
	}

	let mut tx = db.pool.begin().await?;

	for record in records {
		if record.url.trim().is_empty() {
			return Err(Error::InvalidArgument("Page record url must be non-empty.".to_string()));
		}

		sqlx::query(
			"\
INSERT INTO page_cache (url, title, description, embedding, created_at, updated_at)
VALUES ($1,$2,$3,$4,$5,$5)
ON CONFLICT (url) DO UPDATE
SET
\ttitle = EXCLUDED.title,
\tdescription = EXCLUDED.description,
\tembedding = EXCLUDED.embedding,
\tupdated_at = EXCLUDED.updated_at",
		)
		.bind(record.url.as_str())
		.bind(record.title.as_str())
		.bind(record.description.as_str())
		.bind(record.embedding.as_slice())
		.bind(now)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(())
}

/// Returns an unexpired payload and records the hit.
pub async fn fetch_cluster_result(
	db: &Db,
	cache_key: &str,
	now: OffsetDateTime,
) -> Result<Option<Value>> {
	let row = sqlx::query_as::<_, ClusterResultRow>(
		"\
SELECT
\tcache_key,
\tpayload,
\tcreated_at,
\texpires_at,
\thit_count
FROM cluster_results
WHERE cache_key = $1 AND expires_at > $2",
	)
	.bind(cache_key)
	.bind(now)
	.fetch_optional(&db.pool)
	.await?;
	let Some(row) = row else {
		return Ok(None);
	};

	sqlx::query(
		"\
UPDATE cluster_results
SET last_accessed_at = $1, hit_count = hit_count + 1
WHERE cache_key = $2",
	)
	.bind(now)
	.bind(cache_key)
	.execute(&db.pool)
	.await?;

	Ok(Some(row.payload))
}

pub async fn store_cluster_result<'e, E>(
	executor: E,
	cache_key: &str,
	payload: &Value,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO cluster_results (cache_key, payload, created_at, last_accessed_at, expires_at, hit_count)
VALUES ($1,$2,$3,$3,$4,0)
ON CONFLICT (cache_key) DO UPDATE
SET
\tpayload = EXCLUDED.payload,
\tlast_accessed_at = EXCLUDED.last_accessed_at,
\texpires_at = EXCLUDED.expires_at,
\thit_count = 0",
	)
	.bind(cache_key)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn purge_expired_cluster_results<'e, E>(executor: E, now: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM cluster_results WHERE expires_at <= $1")
		.bind(now)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
