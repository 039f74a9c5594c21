pub mod dbscan;
pub mod dedupe;
pub mod item;
pub mod label;

mod error;

pub use error::{Error, Result};
pub use item::{ClusterSummary, ClusteredItem, ContentItem, EmbeddedItem, NOISE};
