//! Octree construction and partial rebuild.
//!
//! # Algorithm
//!
//! 1. Seed a FIFO work queue with the root cell
//! 2. Pop a cell, classify it (or copy its previous classification when
//!    it lies outside the rebuild region), append it to its layer
//! 3. Mixed cells above the depth cap enqueue their 8 children
//! 4. Link 26-neighbors over the finished layers
//!
//! The queue drains depth by depth, and children are enqueued in octant
//! order behind their Morton-sorted parents, so every layer comes out
//! Morton-sorted and each parent's children land contiguously.

use std::collections::VecDeque;

use web_time::Instant;

use super::tree::cell_bounds_in;
use super::{morton, BuildStats, CubeBounds, DAabb3, NavNode, NodeRef, NodeState, Octree, MAX_DEPTH};
use crate::classifier::{Occupancy, VoxelClassifier};
use crate::error::{NavError, NavResult};
use crate::links::link_neighbors;
use crate::probe::CollisionProbe;

/// One pending cell.
struct BuildTask {
	depth: u8,
	morton: u64,
	parent: Option<NodeRef>,
	/// Same cell in the previous version, if it existed.
	previous: Option<NodeRef>,
}

/// Previous version plus the region that changed since it was built.
#[derive(Clone, Copy)]
struct Reuse<'p> {
	octree: &'p Octree,
	region: &'p DAabb3,
}

/// Builds navigation octrees against a collision probe.
pub struct OctreeBuilder<'a, P: CollisionProbe + ?Sized> {
	probe: &'a P,
	clearance: f64,
}

impl<'a, P: CollisionProbe + ?Sized> OctreeBuilder<'a, P> {
	/// `clearance` inflates every probed cube (agent radius).
	pub fn new(probe: &'a P, clearance: f64) -> Self {
		Self { probe, clearance }
	}

	/// Build a complete octree over `root`.
	#[tracing::instrument(skip_all, name = "octree::build")]
	pub fn build(&self, root: CubeBounds, max_depth: u8) -> NavResult<(Octree, BuildStats)> {
		root.validate()?;
		if max_depth > MAX_DEPTH {
			return Err(NavError::InvalidConfig(format!(
				"max_depth {max_depth} exceeds {MAX_DEPTH}"
			)));
		}

		let (octree, stats) = self.subdivide(root, max_depth, None)?;
		tracing::info!(
			nodes = stats.total_nodes(),
			free = stats.free_leaves,
			blocked = stats.blocked_leaves,
			forced_blocked = stats.forced_blocked,
			probe_calls = stats.probe_calls,
			bytes = stats.memory_bytes,
			duration_us = stats.duration_us,
			"octree built"
		);
		Ok((octree, stats))
	}

	/// Build a new version of `previous` with `region` re-probed.
	///
	/// Cells not touching `region` keep their previous classification and
	/// subtree without probing. `previous` is left untouched.
	#[tracing::instrument(skip_all, name = "octree::rebuild")]
	pub fn rebuild(&self, previous: &Octree, region: &DAabb3) -> NavResult<(Octree, BuildStats)> {
		let reuse = Reuse {
			octree: previous,
			region,
		};
		let (octree, stats) = self.subdivide(*previous.bounds(), previous.max_depth(), Some(reuse))?;
		tracing::info!(
			nodes = stats.total_nodes(),
			reused = stats.reused_nodes,
			probe_calls = stats.probe_calls,
			duration_us = stats.duration_us,
			"octree rebuilt"
		);
		Ok((octree, stats))
	}

	fn subdivide(&self, root: CubeBounds, max_depth: u8, reuse: Option<Reuse<'_>>) -> NavResult<(Octree, BuildStats)> {
		let start = Instant::now();
		let classifier = VoxelClassifier::new(self.probe, self.clearance);
		let mut stats = BuildStats::default();
		let mut layers: Vec<Vec<NavNode>> = vec![Vec::new(); max_depth as usize + 1];

		let mut queue = VecDeque::new();
		queue.push_back(BuildTask {
			depth: 0,
			morton: 0,
			parent: None,
			previous: reuse.map(|_| NodeRef::ROOT),
		});

		{
			let _span = tracing::debug_span!("subdivide").entered();
			while let Some(task) = queue.pop_front() {
				let bounds = cell_bounds_in(&root, task.depth, task.morton);

				let previous_node = match (reuse, task.previous) {
					(Some(reuse), Some(old)) => Some((reuse, reuse.octree.node(old))),
					_ => None,
				};
				let carried = previous_node
					.filter(|(reuse, _)| !reuse.region.overlaps(&bounds.to_aabb()))
					.map(|(_, old)| old.state);

				let state = match carried {
					Some(state) => {
						stats.reused_nodes += 1;
						state
					}
					None => match classifier.classify(&bounds)? {
						Occupancy::Free => NodeState::Free,
						Occupancy::Blocked => NodeState::Blocked,
						Occupancy::Mixed if task.depth < max_depth => NodeState::HasChildren,
						Occupancy::Mixed => {
							stats.forced_blocked += 1;
							NodeState::Blocked
						}
					},
				};

				let this = NodeRef::new(task.depth, layers[task.depth as usize].len() as u32);
				layers[task.depth as usize].push(NavNode::new(task.morton, state, task.parent));
				if let Some(parent) = task.parent {
					if morton::octant(task.morton) == 0 {
						layers[parent.layer as usize][parent.index as usize].first_child = this.index;
					}
				}

				match state {
					NodeState::Free => stats.free_leaves += 1,
					NodeState::Blocked => stats.blocked_leaves += 1,
					NodeState::HasChildren => {
						let old_parent = previous_node.map(|(_, old)| old).filter(|old| old.has_children());
						for octant in 0..8u8 {
							queue.push_back(BuildTask {
								depth: task.depth + 1,
								morton: morton::child(task.morton, octant),
								parent: Some(this),
								previous: old_parent.and_then(|old| old.child(task.depth, octant)),
							});
						}
					}
				}
			}
		}
		stats.probe_calls = classifier.probe_calls();

		let mut octree = Octree::from_layers(root, max_depth, layers);
		{
			let _span = tracing::debug_span!("link_neighbors").entered();
			link_neighbors(&mut octree);
		}

		stats.nodes_per_layer = octree.layers().iter().map(Vec::len).collect();
		stats.memory_bytes = octree.memory_bytes();
		stats.duration_us = start.elapsed().as_micros() as u64;
		for (depth, count) in stats.nodes_per_layer.iter().enumerate() {
			tracing::debug!(depth, nodes = count, "layer");
		}
		Ok((octree, stats))
	}
}

#[cfg(test)]
#[path = "build_test.rs"]
mod build_test;
