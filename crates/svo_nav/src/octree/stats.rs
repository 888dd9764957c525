//! Statistics from octree construction.

/// Statistics from one build or rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildStats {
	/// Node count per layer (index = depth).
	pub nodes_per_layer: Vec<usize>,
	/// Traversable leaves.
	pub free_leaves: usize,
	/// Obstructed leaves, including the forced ones.
	pub blocked_leaves: usize,
	/// Mixed nodes at the depth cap classified Blocked.
	/// Tracked separately - these may hide thin free gaps.
	pub forced_blocked: usize,
	/// Nodes whose classification was copied from the previous version.
	pub reused_nodes: usize,
	/// Collision probe queries issued.
	pub probe_calls: u64,
	/// Approximate node storage footprint.
	pub memory_bytes: usize,
	/// Wall time in microseconds.
	pub duration_us: u64,
}

impl BuildStats {
	#[inline]
	pub fn total_nodes(&self) -> usize {
		self.nodes_per_layer.iter().sum()
	}

	#[inline]
	pub fn total_leaves(&self) -> usize {
		self.free_leaves + self.blocked_leaves
	}

	/// Nodes that went through the classifier.
	#[inline]
	pub fn classified_nodes(&self) -> usize {
		self.total_nodes() - self.reused_nodes
	}
}
