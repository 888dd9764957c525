//! Octree - layered sparse voxel octree.
//!
//! Each layer is a Morton-sorted vector of nodes at one depth. Lookup of a
//! node by `(depth, morton)` is a binary search; the 8 children of a node
//! are contiguous in the next layer, ordered by octant.

use glam::DVec3;

use super::{morton, CubeBounds, NavNode, NodeKey, NodeRef};
use crate::error::{NavError, NavResult};

/// Bounds of grid cell `morton` at `depth` inside `root`.
pub(crate) fn cell_bounds_in(root: &CubeBounds, depth: u8, morton: u64) -> CubeBounds {
	let size = root.size() / (1u64 << depth) as f64;
	let cell = morton::decode(morton);
	let min = root.min() + cell.as_dvec3() * size;
	CubeBounds::new(min + DVec3::splat(size * 0.5), size * 0.5)
}

/// Immutable navigation octree produced by [`OctreeBuilder`](super::OctreeBuilder).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Octree {
	bounds: CubeBounds,
	max_depth: u8,
	layers: Vec<Vec<NavNode>>,
}

impl Octree {
	pub(crate) fn from_layers(bounds: CubeBounds, max_depth: u8, layers: Vec<Vec<NavNode>>) -> Self {
		Self {
			bounds,
			max_depth,
			layers,
		}
	}

	/// Root cube.
	#[inline]
	pub fn bounds(&self) -> &CubeBounds {
		&self.bounds
	}

	#[inline]
	pub fn max_depth(&self) -> u8 {
		self.max_depth
	}

	/// Layers in depth order. Trailing layers may be empty.
	#[inline]
	pub fn layers(&self) -> &[Vec<NavNode>] {
		&self.layers
	}

	#[inline]
	pub fn layer(&self, depth: u8) -> &[NavNode] {
		self.layers.get(depth as usize).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Node behind a reference from this octree version.
	///
	/// # Panics
	/// If `node` was not produced by this octree.
	#[inline]
	pub fn node(&self, node: NodeRef) -> &NavNode {
		&self.layers[node.layer as usize][node.index as usize]
	}

	#[inline]
	pub fn get(&self, node: NodeRef) -> Option<&NavNode> {
		self.layers.get(node.layer as usize)?.get(node.index as usize)
	}

	#[inline]
	pub(crate) fn node_mut(&mut self, node: NodeRef) -> &mut NavNode {
		&mut self.layers[node.layer as usize][node.index as usize]
	}

	#[inline]
	pub fn root(&self) -> NodeRef {
		NodeRef::ROOT
	}

	pub fn node_count(&self) -> usize {
		self.layers.iter().map(Vec::len).sum()
	}

	/// Binary search for the node with `morton` at `depth`.
	pub fn find(&self, depth: u8, morton: u64) -> Option<NodeRef> {
		let layer = self.layers.get(depth as usize)?;
		let index = layer.binary_search_by_key(&morton, |n| n.morton).ok()?;
		Some(NodeRef::new(depth, index as u32))
	}

	#[inline]
	pub fn find_key(&self, key: NodeKey) -> Option<NodeRef> {
		self.find(key.depth, key.morton)
	}

	#[inline]
	pub fn key(&self, node: NodeRef) -> NodeKey {
		NodeKey {
			depth: node.layer,
			morton: self.node(node).morton,
		}
	}

	/// Edge length of nodes at `depth`.
	#[inline]
	pub fn cell_size(&self, depth: u8) -> f64 {
		self.bounds.size() / (1u64 << depth) as f64
	}

	/// Bounds of the grid cell `morton` at `depth`, whether or not a node exists there.
	#[inline]
	pub fn cell_bounds(&self, depth: u8, morton: u64) -> CubeBounds {
		cell_bounds_in(&self.bounds, depth, morton)
	}

	#[inline]
	pub fn node_bounds(&self, node: NodeRef) -> CubeBounds {
		self.cell_bounds(node.layer, self.node(node).morton)
	}

	#[inline]
	pub fn node_center(&self, node: NodeRef) -> DVec3 {
		self.node_bounds(node).center
	}

	/// Leaf containing `point`, found by descending from the root.
	///
	/// Points on a split plane belong to the child on the positive side.
	pub fn locate_leaf(&self, point: DVec3) -> NavResult<NodeRef> {
		if !self.bounds.contains_point(point) {
			return Err(NavError::PointOutsideBounds { point });
		}

		let mut current = self.root();
		loop {
			let node = self.node(current);
			if node.is_leaf() {
				return Ok(current);
			}
			let octant = self.node_bounds(current).octant_of(point);
			match node.child(current.layer, octant) {
				Some(child) => current = child,
				None => return Ok(current),
			}
		}
	}

	/// Free leaf containing `point`.
	pub fn locate_free_leaf(&self, point: DVec3) -> NavResult<NodeRef> {
		let leaf = self.locate_leaf(point)?;
		if self.node(leaf).is_blocked() {
			return Err(NavError::PointInBlockedNode { point, node: leaf });
		}
		Ok(leaf)
	}

	/// Children of `node` in octant order (empty for leaves).
	pub fn children(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
		let n = self.node(node);
		(0..8u8).filter_map(move |octant| n.child(node.layer, octant))
	}

	/// All nodes, layer by layer.
	pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &NavNode)> + '_ {
		self.layers.iter().enumerate().flat_map(|(depth, layer)| {
			layer
				.iter()
				.enumerate()
				.map(move |(index, node)| (NodeRef::new(depth as u8, index as u32), node))
		})
	}

	/// All leaves (Free and Blocked), layer by layer.
	pub fn leaves(&self) -> impl Iterator<Item = NodeRef> + '_ {
		self.iter().filter(|(_, n)| n.is_leaf()).map(|(r, _)| r)
	}

	pub fn free_leaves(&self) -> impl Iterator<Item = NodeRef> + '_ {
		self.iter().filter(|(_, n)| n.is_free()).map(|(r, _)| r)
	}

	pub fn leaf_count(&self) -> usize {
		self.leaves().count()
	}

	/// Approximate heap footprint of the node storage.
	pub fn memory_bytes(&self) -> usize {
		std::mem::size_of::<Self>()
			+ self
				.layers
				.iter()
				.map(|l| std::mem::size_of::<Vec<NavNode>>() + l.capacity() * std::mem::size_of::<NavNode>())
				.sum::<usize>()
	}
}
