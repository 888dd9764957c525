//! LinkResolver - 26-neighbor linkage and the traversal graph.
//!
//! # Phases
//!
//! 1. Neighbor pass: every node gets a same-depth or coarser neighbor per
//!    direction (done once per build, stored on the node)
//! 2. Touching leaves: a leaf's neighbors are expanded to the leaves that
//!    share a face, edge or corner with it
//! 3. Clearance: distance from each Free leaf's center to the nearest
//!    touching Blocked leaf
//! 4. Links: Free leaf -> every touching Free leaf, costed by distance and
//!    the target's clearance
//!
//! # Cost
//!
//! ```text
//! cost(a -> b) = |c_a - c_b| * (1 + w * h_b / (h_b + clearance(b)))
//! ```
//!
//! The factor is >= 1, so every cost is at least the Euclidean distance
//! between centers and the Euclidean heuristic stays admissible.

use std::collections::{BTreeMap, HashSet};

use glam::{DVec3, IVec3};
use rayon::prelude::*;
use smallvec::{smallvec, SmallVec};

use crate::octree::direction::octant_faces_back;
use crate::octree::{morton, DAabb3, NodeKey, NodeRef, Octree, DIRECTIONS, DIRECTION_COUNT};

/// Leaves touching one leaf. Uniform regions have at most 26.
pub type TouchingLeaves = SmallVec<[NodeRef; 32]>;

/// Outgoing links of one leaf.
pub type LinkList = SmallVec<[Link; 8]>;

/// Directed traversal edge.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
	pub to: NodeRef,
	/// Traversal cost, >= center distance.
	pub cost: f64,
}

// =============================================================================
// Neighbor pass
// =============================================================================

/// Deepest node at or above `node`'s depth that contains the grid cell next
/// to `node` in direction `dir`. `None` past the root boundary.
///
/// Checks the same depth first, then progressively coarser depths.
pub fn find_neighbor(octree: &Octree, node: NodeRef, dir: IVec3) -> Option<NodeRef> {
	let cell = morton::decode(octree.node(node).morton).as_ivec3() + dir;
	let cells = 1i32 << node.layer;
	if cell.min_element() < 0 || cell.max_element() >= cells {
		return None;
	}
	let cell = cell.as_uvec3();

	for depth in (0..=node.layer).rev() {
		let shift = (node.layer - depth) as u32;
		if let Some(found) = octree.find(depth, morton::encode(cell >> shift)) {
			return Some(found);
		}
	}
	None
}

/// Fill every node's 26 neighbor references.
pub fn link_neighbors(octree: &mut Octree) {
	let refs: Vec<NodeRef> = octree.iter().map(|(r, _)| r).collect();
	let computed: Vec<[Option<NodeRef>; DIRECTION_COUNT]> = refs
		.par_iter()
		.map(|&r| {
			let mut neighbors = [None; DIRECTION_COUNT];
			for (slot, dir) in neighbors.iter_mut().zip(DIRECTIONS.iter()) {
				*slot = find_neighbor(octree, r, *dir);
			}
			neighbors
		})
		.collect();

	for (r, neighbors) in refs.into_iter().zip(computed) {
		octree.node_mut(r).neighbors = neighbors;
	}
}

/// All leaves sharing a face, edge or corner with `node`, sorted and deduplicated.
///
/// A coarser neighbor is a leaf and counts once however many directions
/// reach it. A same-depth neighbor with children is descended into the
/// children on the near side.
pub fn touching_leaves(octree: &Octree, node: NodeRef) -> TouchingLeaves {
	let mut out = TouchingLeaves::new();
	for (neighbor, dir) in octree.node(node).neighbors.iter().zip(DIRECTIONS.iter()) {
		let Some(neighbor) = *neighbor else {
			continue;
		};

		let mut stack: SmallVec<[NodeRef; 16]> = smallvec![neighbor];
		while let Some(current) = stack.pop() {
			let n = octree.node(current);
			if n.is_leaf() {
				out.push(current);
				continue;
			}
			for octant in (0..8u8).filter(|&o| octant_faces_back(o, *dir)) {
				if let Some(child) = n.child(current.layer, octant) {
					stack.push(child);
				}
			}
		}
	}
	out.sort_unstable();
	out.dedup();
	out
}

// =============================================================================
// Graph
// =============================================================================

/// Outgoing links and clearance per leaf, indexed like the octree layers.
///
/// Only Free leaves carry links; Blocked leaves and internal nodes have none.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdjacencyGraph {
	links: Vec<Vec<LinkList>>,
	/// Distance to the nearest touching Blocked leaf; `None` if there is none.
	clearance: Vec<Vec<Option<f64>>>,
}

impl AdjacencyGraph {
	fn empty_for(octree: &Octree) -> Self {
		Self {
			links: octree.layers().iter().map(|l| vec![LinkList::new(); l.len()]).collect(),
			clearance: octree.layers().iter().map(|l| vec![None; l.len()]).collect(),
		}
	}

	#[inline]
	pub fn links(&self, node: NodeRef) -> &[Link] {
		self
			.links
			.get(node.layer as usize)
			.and_then(|l| l.get(node.index as usize))
			.map(|l| l.as_slice())
			.unwrap_or(&[])
	}

	#[inline]
	pub fn clearance(&self, node: NodeRef) -> Option<f64> {
		self.clearance.get(node.layer as usize)?.get(node.index as usize).copied().flatten()
	}

	fn set(&mut self, node: NodeRef, clearance: Option<f64>, links: Option<LinkList>) {
		let (layer, index) = (node.layer as usize, node.index as usize);
		self.clearance[layer][index] = clearance;
		if let Some(links) = links {
			self.links[layer][index] = links;
		}
	}

	/// Total directed links.
	pub fn link_count(&self) -> usize {
		self.links.iter().flatten().map(|l| l.len()).sum()
	}

	/// Every directed link with its source.
	pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Link)> + '_ {
		self.links.iter().enumerate().flat_map(|(layer, nodes)| {
			nodes.iter().enumerate().flat_map(move |(index, links)| {
				let from = NodeRef::new(layer as u8, index as u32);
				links.iter().map(move |link| (from, link))
			})
		})
	}

	/// Links keyed by version-independent node identity, for comparing graphs
	/// across rebuilds.
	pub fn edge_map(&self, octree: &Octree) -> BTreeMap<(NodeKey, NodeKey), f64> {
		self
			.iter()
			.map(|(from, link)| ((octree.key(from), octree.key(link.to)), link.cost))
			.collect()
	}

	/// Approximate heap footprint.
	pub fn memory_bytes(&self) -> usize {
		let links: usize = self
			.links
			.iter()
			.map(|l| l.len() * std::mem::size_of::<LinkList>())
			.sum();
		let spilled: usize = self
			.links
			.iter()
			.flatten()
			.filter(|l| l.spilled())
			.map(|l| l.capacity() * std::mem::size_of::<Link>())
			.sum();
		let clearance: usize = self
			.clearance
			.iter()
			.map(|l| l.len() * std::mem::size_of::<Option<f64>>())
			.sum();
		links + spilled + clearance
	}
}

// =============================================================================
// Resolver
// =============================================================================

/// Builds an [`AdjacencyGraph`] from a linked octree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkResolver {
	/// Weight of the clearance penalty (0 = pure distance).
	pub clearance_weight: f64,
}

impl LinkResolver {
	pub fn new(clearance_weight: f64) -> Self {
		Self { clearance_weight }
	}

	/// Cost of moving from `from` to a leaf with bounds (`to`, `to_half`) and clearance.
	#[inline]
	pub fn cost(&self, from: DVec3, to: DVec3, to_half: f64, to_clearance: Option<f64>) -> f64 {
		let penalty = match to_clearance {
			Some(clearance) => to_half / (to_half + clearance),
			None => 0.0,
		};
		from.distance(to) * (1.0 + self.clearance_weight * penalty)
	}

	/// Resolve the full graph.
	#[tracing::instrument(skip_all, name = "links::resolve")]
	pub fn resolve(&self, octree: &Octree) -> AdjacencyGraph {
		let mut graph = AdjacencyGraph::empty_for(octree);
		let free: Vec<NodeRef> = octree.free_leaves().collect();

		let touching: Vec<TouchingLeaves> = free.par_iter().map(|&r| touching_leaves(octree, r)).collect();
		for (&r, t) in free.iter().zip(&touching) {
			graph.set(r, leaf_clearance(octree, r, t), None);
		}

		let links: Vec<LinkList> = free
			.par_iter()
			.zip(touching.par_iter())
			.map(|(&r, t)| self.outgoing(octree, &graph, r, t))
			.collect();
		for (&r, l) in free.iter().zip(links) {
			let clearance = graph.clearance(r);
			graph.set(r, clearance, Some(l));
		}

		tracing::debug!(
			free_leaves = free.len(),
			links = graph.link_count(),
			"graph resolved"
		);
		graph
	}

	/// Resolve the graph of `octree`, a rebuild of `previous` over `region`.
	///
	/// Recomputes clearance for changed leaves and the leaves touching them,
	/// and links for those plus one more ring; every other leaf carries its
	/// links over through [`NodeKey`] remapping. Equal to [`resolve`](Self::resolve)
	/// on `octree`.
	#[tracing::instrument(skip_all, name = "links::resolve_incremental")]
	pub fn resolve_incremental(
		&self,
		previous: &Octree,
		previous_graph: &AdjacencyGraph,
		octree: &Octree,
		region: &DAabb3,
	) -> AdjacencyGraph {
		let changed: Vec<NodeRef> = octree
			.leaves()
			.filter(|&r| {
				let node = octree.node(r);
				region.overlaps(&octree.node_bounds(r).to_aabb())
					|| previous
						.find(r.layer, node.morton)
						.map_or(true, |old| previous.node(old).state != node.state)
			})
			.collect();

		let mut clearance_dirty: HashSet<NodeRef> = changed.iter().copied().collect();
		for &r in &changed {
			clearance_dirty.extend(touching_leaves(octree, r));
		}
		let mut links_dirty = clearance_dirty.clone();
		for &r in &clearance_dirty {
			links_dirty.extend(touching_leaves(octree, r));
		}

		let mut graph = AdjacencyGraph::empty_for(octree);
		let free: Vec<NodeRef> = octree.free_leaves().collect();

		for &r in &free {
			let carried = if clearance_dirty.contains(&r) {
				None
			} else {
				previous.find_key(octree.key(r)).map(|old| previous_graph.clearance(old))
			};
			let clearance = match carried {
				Some(clearance) => clearance,
				None => leaf_clearance(octree, r, &touching_leaves(octree, r)),
			};
			graph.set(r, clearance, None);
		}

		let mut recomputed = 0usize;
		for &r in &free {
			let carried = if links_dirty.contains(&r) {
				None
			} else {
				remap_links(previous, previous_graph, octree, r)
			};
			let links = match carried {
				Some(links) => links,
				None => {
					recomputed += 1;
					self.outgoing(octree, &graph, r, &touching_leaves(octree, r))
				}
			};
			let clearance = graph.clearance(r);
			graph.set(r, clearance, Some(links));
		}

		tracing::debug!(
			changed = changed.len(),
			recomputed,
			carried = free.len() - recomputed,
			"graph re-resolved"
		);
		graph
	}

	fn outgoing(&self, octree: &Octree, graph: &AdjacencyGraph, from: NodeRef, touching: &[NodeRef]) -> LinkList {
		let from_center = octree.node_center(from);
		touching
			.iter()
			.filter(|&&to| octree.node(to).is_free())
			.map(|&to| {
				let bounds = octree.node_bounds(to);
				Link {
					to,
					cost: self.cost(from_center, bounds.center, bounds.half_extent, graph.clearance(to)),
				}
			})
			.collect()
	}
}

impl Default for LinkResolver {
	fn default() -> Self {
		Self::new(1.0)
	}
}

/// Distance from the leaf's center to the nearest touching Blocked leaf.
fn leaf_clearance(octree: &Octree, leaf: NodeRef, touching: &[NodeRef]) -> Option<f64> {
	let center = octree.node_center(leaf);
	touching
		.iter()
		.filter(|&&t| octree.node(t).is_blocked())
		.map(|&t| octree.node_bounds(t).distance_to_point(center))
		.min_by(f64::total_cmp)
}

/// Previous links of the same leaf, targets remapped into `octree`.
fn remap_links(previous: &Octree, previous_graph: &AdjacencyGraph, octree: &Octree, leaf: NodeRef) -> Option<LinkList> {
	let old = previous.find_key(octree.key(leaf))?;
	previous_graph
		.links(old)
		.iter()
		.map(|link| {
			octree
				.find_key(previous.key(link.to))
				.map(|to| Link { to, cost: link.cost })
		})
		.collect()
}

#[cfg(test)]
#[path = "links_test.rs"]
mod links_test;
