use sift_service::ClusterRequest;

use super::{build_fixture, sample_items, test_db};

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn identical_requests_hit_the_result_cache() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping identical_requests_hit_the_result_cache; set SIFT_PG_DSN to run.");

		return;
	};
	let fixture = build_fixture(test_db.dsn().to_string()).await;
	let first = fixture
		.service
		.cluster(ClusterRequest::from_items(sample_items()))
		.await
		.expect("First run failed.");

	assert!(!first.cached);
	assert_eq!(first.summaries.len(), 2);
	assert_eq!(first.summaries[0].name, "Sample Pages");
	assert_eq!(first.summaries[0].count, 3);
	assert!(first.summaries[1].is_noise());

	let completions = fixture.completion.count();
	let embeddings = fixture.embedding.count();
	let second = fixture
		.service
		.cluster(ClusterRequest::from_items(sample_items()))
		.await
		.expect("Second run failed.");

	assert!(second.cached);
	assert_eq!(second.summaries, first.summaries);
	assert_eq!(fixture.completion.count(), completions);
	assert_eq!(fixture.embedding.count(), embeddings);

	let hits: i64 = sqlx::query_scalar("SELECT hit_count FROM cluster_results")
		.fetch_one(&fixture.db.pool)
		.await
		.expect("Failed to read hit count.");

	assert_eq!(hits, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn changed_parameters_miss_the_result_cache() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping changed_parameters_miss_the_result_cache; set SIFT_PG_DSN to run.");

		return;
	};
	let fixture = build_fixture(test_db.dsn().to_string()).await;

	fixture
		.service
		.cluster(ClusterRequest::from_items(sample_items()))
		.await
		.expect("First run failed.");

	let mut req = ClusterRequest::from_items(sample_items());

	req.epsilon = Some(20.0);

	let widened = fixture.service.cluster(req).await.expect("Second run failed.");

	assert!(!widened.cached);
	assert_eq!(widened.summaries.len(), 1);
	assert_eq!(widened.summaries[0].count, 4);

	let stored: i64 = sqlx::query_scalar("SELECT count(*) FROM cluster_results")
		.fetch_one(&fixture.db.pool)
		.await
		.expect("Failed to count results.");

	assert_eq!(stored, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
