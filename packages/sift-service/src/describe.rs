use std::collections::HashMap;

use futures::{StreamExt, stream};
use serde_json::Value;

use sift_domain::ContentItem;
use sift_providers::completion;

use crate::{PageRecord, SiftService, StageReport};

const STAGE: &str = "describe";
const DESCRIBE_SYSTEM_PROMPT: &str = "\
You write short semantic descriptions of web pages so they can be grouped by topic. \
Reply with two or three plain sentences about what the page covers and who it is for. \
Ignore navigation, ads, and boilerplate. Do not add headings or lists.";

impl SiftService {
	/// Fills `description` for every item, reusing cached descriptions where present.
	///
	/// Output has the same length and order as `items`. Items with neither content nor a title,
	/// and items whose generation failed, come back with an empty description.
	pub async fn describe_items(&self, items: Vec<ContentItem>) -> (Vec<ContentItem>, StageReport) {
		let mut items = items;
		let mut report = StageReport::default();
		let urls: Vec<String> = items.iter().map(|item| item.url.clone()).collect();
		let cached: HashMap<String, PageRecord> = self
			.lookup_pages(&urls, STAGE)
			.await
			.into_iter()
			.map(|record| (record.url.clone(), record))
			.collect();
		let mut pending = Vec::new();

		for (index, item) in items.iter_mut().enumerate() {
			if let Some(record) = cached.get(&item.url)
				&& !record.description.trim().is_empty()
			{
				item.description = record.description.clone();
				report.cache_hits += 1;

				continue;
			}
			if item.is_blank() {
				tracing::debug!(url = %item.url, "Nothing to describe; leaving description empty.");

				report.skipped += 1;

				continue;
			}

			pending.push(index);
		}

		let max_chars = self.cfg.pipeline.max_content_chars;
		let results: Vec<(usize, crate::Result<String>)> = stream::iter(pending)
			.map(|index| {
				let messages = build_describe_messages(&items[index], max_chars);

				async move { (index, self.complete(&messages).await) }
			})
			.buffered(self.cfg.pipeline.concurrency)
			.collect()
			.await;
		let mut records = Vec::with_capacity(results.len());

		for (index, result) in results {
			let item = &mut items[index];

			match result {
				Ok(description) => {
					item.description = description;
					report.generated += 1;

					// A new description invalidates any cached embedding for this URL.
					records.push(PageRecord {
						url: item.url.clone(),
						title: item.title.clone(),
						description: item.description.clone(),
						embedding: Vec::new(),
					});
				},
				Err(err) => {
					tracing::warn!(error = %err, url = %item.url, "Description generation failed.");

					report.failed += 1;
				},
			}
		}

		self.persist_pages(&records, STAGE).await;

		tracing::info!(
			items = items.len(),
			cache_hits = report.cache_hits,
			generated = report.generated,
			skipped = report.skipped,
			failed = report.failed,
			"Description stage finished."
		);

		(items, report)
	}
}

pub(crate) fn build_describe_messages(item: &ContentItem, max_chars: usize) -> Vec<Value> {
	let (excerpt, truncated) = excerpt(&item.content, max_chars);
	let mut user = format!("URL: {}\nTitle: {}\n\nContent:\n{}", item.url, item.title, excerpt);

	if truncated {
		user.push_str("\n[content truncated]");
	}

	completion::chat_messages(DESCRIBE_SYSTEM_PROMPT, &user)
}

/// Cuts `content` to at most `max_chars` characters on a char boundary.
pub(crate) fn excerpt(content: &str, max_chars: usize) -> (&str, bool) {
	match content.char_indices().nth(max_chars) {
		Some((cut, _)) => (&content[..cut], true),
		None => (content, false),
	}
}
