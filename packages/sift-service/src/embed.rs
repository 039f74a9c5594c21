use std::collections::HashMap;

use futures::{StreamExt, stream};

use sift_domain::{ContentItem, EmbeddedItem};

use crate::{PageRecord, SiftService, StageReport};

const STAGE: &str = "embed";

impl SiftService {
	/// Attaches an embedding of each item's description.
	///
	/// Items without a description and items whose embedding failed are dropped; the rest keep
	/// their input order. Cached vectors are reused only when they match the configured dimension.
	pub async fn embed_items(&self, items: Vec<ContentItem>) -> (Vec<EmbeddedItem>, StageReport) {
		let mut report = StageReport::default();
		let dimensions = self.cfg.providers.embedding.dimensions as usize;
		let described: Vec<ContentItem> = items
			.into_iter()
			.filter(|item| {
				if item.is_described() {
					return true;
				}

				tracing::debug!(url = %item.url, "Skipping embedding for undescribed item.");

				report.skipped += 1;

				false
			})
			.collect();
		let urls: Vec<String> = described.iter().map(|item| item.url.clone()).collect();
		let cached: HashMap<String, PageRecord> = self
			.lookup_pages(&urls, STAGE)
			.await
			.into_iter()
			.map(|record| (record.url.clone(), record))
			.collect();
		let mut vectors: Vec<Option<Vec<f32>>> = vec![None; described.len()];
		let mut pending = Vec::new();

		for (index, item) in described.iter().enumerate() {
			let hit = cached
				.get(&item.url)
				.filter(|record| usable_embedding(&record.embedding, dimensions));

			match hit {
				Some(record) => {
					vectors[index] = Some(record.embedding.clone());
					report.cache_hits += 1;
				},
				None => pending.push(index),
			}
		}

		let results: Vec<(usize, crate::Result<Vec<f32>>)> = stream::iter(pending)
			.map(|index| {
				let text = described[index].description.as_str();

				async move { (index, self.embed_one(text).await) }
			})
			.buffered(self.cfg.pipeline.concurrency)
			.collect()
			.await;
		let mut records = Vec::with_capacity(results.len());

		for (index, result) in results {
			let item = &described[index];

			match result {
				Ok(vector) if usable_embedding(&vector, dimensions) => {
					records.push(PageRecord {
						url: item.url.clone(),
						title: item.title.clone(),
						description: item.description.clone(),
						embedding: vector.clone(),
					});

					vectors[index] = Some(vector);
					report.generated += 1;
				},
				Ok(vector) => {
					tracing::warn!(
						url = %item.url,
						expected = dimensions,
						actual = vector.len(),
						"Embedding has the wrong shape; dropping item."
					);

					report.failed += 1;
				},
				Err(err) => {
					tracing::warn!(error = %err, url = %item.url, "Embedding generation failed.");

					report.failed += 1;
				},
			}
		}

		self.persist_pages(&records, STAGE).await;

		let embedded: Vec<EmbeddedItem> = described
			.into_iter()
			.zip(vectors)
			.filter_map(|(item, vector)| vector.map(|embedding| EmbeddedItem { item, embedding }))
			.collect();

		tracing::info!(
			items = embedded.len(),
			cache_hits = report.cache_hits,
			generated = report.generated,
			skipped = report.skipped,
			failed = report.failed,
			"Embedding stage finished."
		);

		(embedded, report)
	}
}

fn usable_embedding(vector: &[f32], dimensions: usize) -> bool {
	!vector.is_empty() && vector.len() == dimensions && vector.iter().all(|value| value.is_finite())
}
