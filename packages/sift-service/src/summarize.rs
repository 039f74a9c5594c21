use std::collections::BTreeMap;

use futures::{StreamExt, stream};
use serde_json::Value;

use sift_domain::{ClusterSummary, ClusteredItem, NOISE, label};
use sift_providers::completion;

use crate::{SiftService, StageReport};

const SUMMARIZE_SYSTEM_PROMPT: &str = "\
You name groups of related web pages. Reply in exactly this format:\n\
Name: <a 3 to 5 word name for the group>\n\
Description: <a 50 to 100 word description of what the pages have in common>";

impl SiftService {
	/// One summary per cluster, ordered by id, with the noise group last.
	///
	/// Noise gets a fixed summary without a backend call. A failed call yields a fallback summary
	/// that still carries the cluster's URLs.
	pub async fn summarize_clusters(
		&self,
		items: &[ClusteredItem],
	) -> (Vec<ClusterSummary>, StageReport) {
		let mut report = StageReport::default();
		let mut groups: BTreeMap<i32, Vec<&ClusteredItem>> = BTreeMap::new();

		for item in items {
			groups.entry(item.cluster).or_default().push(item);
		}

		let noise = groups.remove(&NOISE);
		let labeled: Vec<ClusterSummary> = stream::iter(groups)
			.map(|(id, members)| async move {
				let urls = member_urls(&members);
				let messages = build_summary_messages(id, &members);

				match self.complete(&messages).await {
					Ok(response) => {
						let parsed = label::parse_cluster_label(&response, id);

						(ClusterSummary::new(id, parsed.name, parsed.description, urls), true)
					},
					Err(err) => {
						tracing::warn!(error = %err, cluster = id, "Cluster summarization failed.");

						let summary = ClusterSummary::new(
							id,
							label::fallback_name(id),
							label::ERROR_DESCRIPTION.to_string(),
							urls,
						);

						(summary, false)
					},
				}
			})
			.buffered(self.cfg.pipeline.concurrency)
			.map(|(summary, ok)| {
				if ok {
					report.generated += 1;
				} else {
					report.failed += 1;
				}

				summary
			})
			.collect()
			.await;
		let mut summaries = labeled;

		if let Some(members) = noise {
			report.skipped += 1;

			summaries.push(ClusterSummary::new(
				NOISE,
				label::NOISE_NAME.to_string(),
				label::NOISE_DESCRIPTION.to_string(),
				member_urls(&members),
			));
		}

		tracing::info!(
			clusters = summaries.len(),
			generated = report.generated,
			failed = report.failed,
			"Summary stage finished."
		);

		(summaries, report)
	}
}

fn member_urls(members: &[&ClusteredItem]) -> Vec<String> {
	members.iter().map(|member| member.item.url.clone()).collect()
}

fn build_summary_messages(cluster_id: i32, members: &[&ClusteredItem]) -> Vec<Value> {
	let mut user = format!("Cluster {cluster_id} has {} pages:\n", members.len());

	for (index, member) in members.iter().enumerate() {
		user.push_str(&format!("{}. {}\n", index + 1, member.item.description.trim()));
	}

	completion::chat_messages(SUMMARIZE_SYSTEM_PROMPT, &user)
}

#[cfg(test)]
mod tests {
	use super::*;
	use sift_domain::ContentItem;

	fn member(url: &str, description: &str, cluster: i32) -> ClusteredItem {
		let mut item = ContentItem::new(url, "", "");

		item.description = description.to_string();

		ClusteredItem { item, embedding: vec![0.0], cluster }
	}

	#[test]
	fn summary_prompt_numbers_member_descriptions() {
		let a = member("https://a.example", "About rust ", 0);
		let b = member("https://b.example", "About cargo", 0);
		let messages = build_summary_messages(0, &[&a, &b]);
		let user = messages[1]["content"].as_str().expect("user content must be a string");

		assert!(user.starts_with("Cluster 0 has 2 pages:"));
		assert!(user.contains("1. About rust\n"));
		assert!(user.contains("2. About cargo\n"));
	}
}
