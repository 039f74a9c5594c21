use serde::{Deserialize, Serialize};

/// Cluster id reserved for points no expansion reached.
pub const NOISE: i32 = -1;

/// A page or history entry. `description` stays empty until the description stage fills it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
	pub url: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub description: String,
}
impl ContentItem {
	pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			title: title.into(),
			content: content.into(),
			description: String::new(),
		}
	}

	pub fn is_described(&self) -> bool {
		!self.description.trim().is_empty()
	}

	/// True when there is neither content nor a title to describe.
	pub fn is_blank(&self) -> bool {
		self.content.trim().is_empty() && self.title.trim().is_empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedItem {
	pub item: ContentItem,
	pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredItem {
	pub item: ContentItem,
	pub embedding: Vec<f32>,
	pub cluster: i32,
}
impl ClusteredItem {
	pub fn is_noise(&self) -> bool {
		self.cluster == NOISE
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
	pub id: i32,
	pub name: String,
	pub description: String,
	pub urls: Vec<String>,
	pub count: usize,
}
impl ClusterSummary {
	pub fn new(id: i32, name: String, description: String, urls: Vec<String>) -> Self {
		let count = urls.len();

		Self { id, name, description, urls, count }
	}

	pub fn is_noise(&self) -> bool {
		self.id == NOISE
	}
}
