//! Navigation nodes and their identifiers.
//!
//! Depth 0 = root (coarsest), higher depth = finer.

use std::fmt;

use super::direction::DIRECTION_COUNT;

/// Position of a node inside one octree version: layer (= depth) and index
/// into that layer's Morton-sorted node vector.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRef {
	pub layer: u8,
	pub index: u32,
}

impl NodeRef {
	pub const ROOT: Self = Self { layer: 0, index: 0 };

	pub fn new(layer: u8, index: u32) -> Self {
		Self { layer, index }
	}
}

impl fmt::Display for NodeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.layer, self.index)
	}
}

/// Version-independent node identity.
///
/// Stable across rebuilds, unlike [`NodeRef`] whose index shifts when a
/// layer gains or loses nodes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeKey {
	pub depth: u8,
	pub morton: u64,
}

/// Classification of a node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeState {
	/// Leaf, traversable.
	Free,
	/// Leaf, obstructed (or forced blocked at the depth cap).
	Blocked,
	/// Internal node with 8 contiguous children in the next layer.
	HasChildren,
}

/// One node of the navigation octree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavNode {
	/// Morton code of the node's grid cell at its own depth.
	pub morton: u64,
	pub state: NodeState,
	/// Index of octant 0 in the next layer. Valid only for `HasChildren`.
	pub first_child: u32,
	pub parent: Option<NodeRef>,
	/// Same-depth or coarser neighbor per direction, `None` past the root boundary.
	pub neighbors: [Option<NodeRef>; DIRECTION_COUNT],
}

impl NavNode {
	pub fn new(morton: u64, state: NodeState, parent: Option<NodeRef>) -> Self {
		Self {
			morton,
			state,
			first_child: 0,
			parent,
			neighbors: [None; DIRECTION_COUNT],
		}
	}

	#[inline]
	pub fn is_leaf(&self) -> bool {
		self.state != NodeState::HasChildren
	}

	#[inline]
	pub fn is_free(&self) -> bool {
		self.state == NodeState::Free
	}

	#[inline]
	pub fn is_blocked(&self) -> bool {
		self.state == NodeState::Blocked
	}

	#[inline]
	pub fn has_children(&self) -> bool {
		self.state == NodeState::HasChildren
	}

	/// Reference to the child in `octant`, if this node has children.
	///
	/// `layer` is this node's own layer.
	pub fn child(&self, layer: u8, octant: u8) -> Option<NodeRef> {
		if !self.has_children() {
			return None;
		}
		Some(NodeRef::new(layer + 1, self.first_child + (octant as u32 & 7)))
	}
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
