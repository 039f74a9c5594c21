use sift_service::ClusterRequest;

use super::{build_fixture, sample_items, test_db};

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn page_cache_round_trips_between_stages() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping page_cache_round_trips_between_stages; set SIFT_PG_DSN to run.");

		return;
	};
	let fixture = build_fixture(test_db.dsn().to_string()).await;
	let (described, report) = fixture.service.describe_items(sample_items()).await;

	assert_eq!(report.generated, 4);

	let urls = vec!["https://a.example".to_string()];
	let rows = sift_storage::queries::fetch_page_records(&fixture.db.pool, &urls)
		.await
		.expect("Failed to fetch pages.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].description, "About https://a.example");
	assert!(rows[0].embedding.is_empty());

	let (embedded, report) = fixture.service.embed_items(described).await;

	assert_eq!(embedded.len(), 4);
	assert_eq!(report.generated, 4);

	let rows = sift_storage::queries::fetch_page_records(&fixture.db.pool, &urls)
		.await
		.expect("Failed to fetch pages.");

	assert_eq!(rows[0].embedding, vec![0.0, 0.0]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn fresh_service_reuses_persisted_pages() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping fresh_service_reuses_persisted_pages; set SIFT_PG_DSN to run.");

		return;
	};
	let first = build_fixture(test_db.dsn().to_string()).await;

	first
		.service
		.cluster(ClusterRequest::from_items(sample_items()))
		.await
		.expect("First run failed.");

	let second = build_fixture(test_db.dsn().to_string()).await;
	let mut req = ClusterRequest::from_items(sample_items());

	req.refresh = true;

	let response = second.service.cluster(req).await.expect("Refresh run failed.");

	assert!(!response.cached);
	assert_eq!(response.stats.described.cache_hits, 4);
	assert_eq!(response.stats.embedded.cache_hits, 4);
	assert_eq!(second.embedding.count(), 0);
	// Only the cluster label is regenerated.
	assert_eq!(second.completion.count(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
