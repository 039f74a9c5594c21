use crate::{AcquireSpec, BoxFuture, ContentItem, ContentSource, Result};

/// Source used when no crawler or history reader is wired in. Acquires nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySource;

impl ContentSource for EmptySource {
	fn acquire<'a>(&'a self, spec: &'a AcquireSpec) -> BoxFuture<'a, Result<Vec<ContentItem>>> {
		Box::pin(async move {
			tracing::debug!(
				fetch_history = spec.fetch_history,
				urls = spec.urls.len(),
				"No content source configured."
			);

			Ok(Vec::new())
		})
	}
}

/// Fixed item list, handed out on every acquisition up to `max_items`.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
	items: Vec<ContentItem>,
}
impl StaticSource {
	pub fn new(items: Vec<ContentItem>) -> Self {
		Self { items }
	}
}

impl ContentSource for StaticSource {
	fn acquire<'a>(&'a self, spec: &'a AcquireSpec) -> BoxFuture<'a, Result<Vec<ContentItem>>> {
		Box::pin(async move {
			let limit = spec.max_items.unwrap_or(self.items.len());

			Ok(self.items.iter().take(limit).cloned().collect())
		})
	}
}
