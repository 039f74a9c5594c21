use std::collections::HashSet;

use crate::ContentItem;

/// Keeps the first item seen for each URL, preserving input order.
pub fn dedupe_by_url(items: Vec<ContentItem>) -> Vec<ContentItem> {
	let mut seen = HashSet::with_capacity(items.len());
	let mut out = Vec::with_capacity(items.len());

	for item in items {
		if seen.contains(item.url.as_str()) {
			tracing::debug!(url = %item.url, title = %item.title, "Dropping duplicate item.");

			continue;
		}

		seen.insert(item.url.clone());
		out.push(item);
	}

	out
}
