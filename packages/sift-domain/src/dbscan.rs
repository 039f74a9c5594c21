//! Density-based clustering over embedding vectors.
//!
//! Neighbor queries are all-pairs, so a run is O(n^2) distance computations. That is fine for the
//! tens to low hundreds of pages a single request carries.

use crate::{ClusteredItem, EmbeddedItem, Error, NOISE, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbscanParams {
	/// Inclusive neighbor radius.
	pub epsilon: f32,
	/// Neighbors, not counting the point itself, required for a core point.
	pub min_points: usize,
}
impl DbscanParams {
	pub fn new(epsilon: f32, min_points: usize) -> Self {
		Self { epsilon, min_points }
	}

	pub fn validate(&self) -> Result<()> {
		if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
			return Err(Error::InvalidParameter {
				message: format!("epsilon must be a positive finite number, got {}.", self.epsilon),
			});
		}
		if self.min_points == 0 {
			return Err(Error::InvalidParameter {
				message: "min_points must be at least one.".to_string(),
			});
		}

		Ok(())
	}
}
impl Default for DbscanParams {
	fn default() -> Self {
		Self { epsilon: 0.75, min_points: 2 }
	}
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Returns the shared dimensionality, or the first vector that disagrees with the first one.
pub fn check_dimensions<P>(points: &[P]) -> Result<Option<usize>>
where
	P: AsRef<[f32]>,
{
	let Some(first) = points.first() else {
		return Ok(None);
	};
	let expected = first.as_ref().len();

	for (index, point) in points.iter().enumerate().skip(1) {
		let actual = point.as_ref().len();

		if actual != expected {
			return Err(Error::DimensionMismatch { index, expected, actual });
		}
	}

	Ok(Some(expected))
}

/// Labels every point with a cluster id, or [`NOISE`].
///
/// Points are visited in input order. Cluster ids are dense and assigned in order of formation.
/// A border point keeps the first cluster that reaches it.
pub fn dbscan<P>(points: &[P], params: DbscanParams) -> Result<Vec<i32>>
where
	P: AsRef<[f32]>,
{
	params.validate()?;
	check_dimensions(points)?;

	let n = points.len();
	let mut labels = vec![NOISE; n];
	let mut visited = vec![false; n];
	let mut next_cluster = 0_i32;

	for seed in 0..n {
		if visited[seed] {
			continue;
		}

		visited[seed] = true;

		let neighbors = region_query(points, seed, params.epsilon);

		// Tentative; a later expansion may still absorb this point as a border point.
		if neighbors.len() < params.min_points {
			continue;
		}

		let cluster = next_cluster;

		next_cluster += 1;
		labels[seed] = cluster;

		let mut queued = vec![false; n];

		queued[seed] = true;

		for &neighbor in &neighbors {
			queued[neighbor] = true;
		}

		let mut worklist = neighbors;
		let mut cursor = 0;

		while cursor < worklist.len() {
			let point = worklist[cursor];

			cursor += 1;

			if !visited[point] {
				visited[point] = true;

				let reachable = region_query(points, point, params.epsilon);

				if reachable.len() >= params.min_points {
					for candidate in reachable {
						if !queued[candidate] {
							queued[candidate] = true;
							worklist.push(candidate);
						}
					}
				}
			}
			if labels[point] == NOISE {
				labels[point] = cluster;
			}
		}
	}

	Ok(labels)
}

/// Runs [`dbscan`] over embedded items and attaches the labels, keeping input order.
pub fn cluster_items(items: Vec<EmbeddedItem>, params: DbscanParams) -> Result<Vec<ClusteredItem>> {
	let labels = {
		let vectors: Vec<&[f32]> = items.iter().map(|item| item.embedding.as_slice()).collect();

		dbscan(&vectors, params)?
	};

	Ok(items
		.into_iter()
		.zip(labels)
		.map(|(embedded, cluster)| ClusteredItem {
			item: embedded.item,
			embedding: embedded.embedding,
			cluster,
		})
		.collect())
}

fn region_query<P>(points: &[P], index: usize, epsilon: f32) -> Vec<usize>
where
	P: AsRef<[f32]>,
{
	let origin = points[index].as_ref();

	points
		.iter()
		.enumerate()
		.filter(|(other, point)| {
			*other != index && euclidean_distance(origin, point.as_ref()) <= epsilon
		})
		.map(|(other, _)| other)
		.collect()
}
