use serde_json::Value;
use time::OffsetDateTime;

use sift_storage::{db::Db, queries};

use crate::{BoxFuture, CacheStore, PageRecord, Result};

impl CacheStore for Db {
	fn fetch_pages<'a>(&'a self, urls: &'a [String]) -> BoxFuture<'a, Result<Vec<PageRecord>>> {
		Box::pin(async move { Ok(queries::fetch_page_records(&self.pool, urls).await?) })
	}

	fn upsert_pages<'a>(
		&'a self,
		records: &'a [PageRecord],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::upsert_page_records(self, records, now).await?) })
	}

	fn fetch_result<'a>(
		&'a self,
		cache_key: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(queries::fetch_cluster_result(self, cache_key, now).await?) })
	}

	fn store_result<'a>(
		&'a self,
		cache_key: &'a str,
		payload: &'a Value,
		now: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::store_cluster_result(&self.pool, cache_key, payload, now, expires_at).await?;

			Ok(())
		})
	}
}
