//! A* over the octree adjacency graph.
//!
//! Nodes are Free leaves of any depth; edges are the resolved links. The
//! open set is a binary heap ordered by `f = g + weight * h`, ties broken by
//! lower `g`, then by insertion order, so identical inputs always expand
//! identical node sequences.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use glam::DVec3;
use web_time::Instant;

use super::budget::{SearchBudget, SearchStats};
use crate::error::{NavError, NavResult};
use crate::links::AdjacencyGraph;
use crate::octree::{NodeRef, Octree};
use crate::path::{NavPath, PathPoint};

/// Check the clock once per this many expansions.
const TIMEOUT_CHECK_INTERVAL: usize = 64;

/// Distance estimate from a node to the goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Heuristic {
	/// Straight-line distance. Admissible for every link cost.
	#[default]
	Euclidean,
	/// Sum of axis distances. Faster to converge, not admissible.
	Manhattan,
}

impl Heuristic {
	#[inline]
	pub fn estimate(self, from: DVec3, to: DVec3) -> f64 {
		match self {
			Heuristic::Euclidean => from.distance(to),
			Heuristic::Manhattan => {
				let d = (to - from).abs();
				d.x + d.y + d.z
			}
		}
	}
}

/// Search parameters.
///
/// Only the defaults give optimal paths. `Manhattan`, an estimate weight
/// above 1, a node size preference or a unit cost all trade path quality
/// for fewer expansions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
	pub heuristic: Heuristic,
	/// Multiplier on the heuristic. 1 = optimal A*; > 1 trades optimality
	/// for fewer expansions (greedy A*).
	pub estimate_weight: f64,
	/// Discount on steps and estimates from coarse leaves, scaled by how far
	/// above the voxel layer a leaf sits. 0 = off. Favors routes through
	/// large open leaves.
	pub node_size_preference: f64,
	/// Constant cost per link in place of the resolved link cost. Counts
	/// hops instead of distance.
	pub unit_cost: Option<f64>,
	pub budget: SearchBudget,
}

impl SearchConfig {
	pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
		self.heuristic = heuristic;
		self
	}

	pub fn with_estimate_weight(mut self, estimate_weight: f64) -> Self {
		self.estimate_weight = estimate_weight;
		self
	}

	pub fn with_node_size_preference(mut self, node_size_preference: f64) -> Self {
		self.node_size_preference = node_size_preference;
		self
	}

	pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
		self.unit_cost = Some(unit_cost);
		self
	}

	pub fn with_budget(mut self, budget: SearchBudget) -> Self {
		self.budget = budget;
		self
	}

	/// Check that every weight keeps step costs and estimates non-negative.
	pub fn validate(&self) -> NavResult<()> {
		if !(self.estimate_weight.is_finite() && self.estimate_weight > 0.0) {
			return Err(NavError::InvalidConfig(format!(
				"estimate_weight must be finite and positive, got {}",
				self.estimate_weight
			)));
		}
		if !(self.node_size_preference.is_finite() && self.node_size_preference >= 0.0) {
			return Err(NavError::InvalidConfig(format!(
				"node_size_preference must be finite and non-negative, got {}",
				self.node_size_preference
			)));
		}
		if let Some(unit_cost) = self.unit_cost {
			if !(unit_cost.is_finite() && unit_cost > 0.0) {
				return Err(NavError::InvalidConfig(format!(
					"unit_cost must be finite and positive, got {unit_cost}"
				)));
			}
		}
		Ok(())
	}
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			heuristic: Heuristic::Euclidean,
			estimate_weight: 1.0,
			node_size_preference: 0.0,
			unit_cost: None,
			budget: SearchBudget::DEFAULT,
		}
	}
}

/// Why a search ended without a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NotFoundReason {
	/// The open set emptied: start and goal are in different components.
	Disconnected,
	/// `SearchBudget::max_expansions` reached.
	ExpansionLimit,
	/// `SearchBudget::timeout` elapsed.
	TimedOut,
}

/// A successful search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
	/// Final waypoints (smoothed when produced through a volume query).
	pub path: NavPath,
	/// Waypoints straight from the node chain.
	pub raw_path: NavPath,
	/// Leaves visited, start leaf to goal leaf.
	pub nodes: Vec<NodeRef>,
	/// Sum of step costs along `nodes` (link costs unless a unit cost or
	/// node size preference is configured).
	pub cost: f64,
	pub stats: SearchStats,
}

/// Outcome of a search that ran. Missing paths are outcomes, not errors.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchOutcome {
	Found(SearchResult),
	NotFound {
		reason: NotFoundReason,
		stats: SearchStats,
	},
}

impl SearchOutcome {
	#[inline]
	pub fn is_found(&self) -> bool {
		matches!(self, SearchOutcome::Found(_))
	}

	pub fn path(&self) -> Option<&NavPath> {
		match self {
			SearchOutcome::Found(result) => Some(&result.path),
			SearchOutcome::NotFound { .. } => None,
		}
	}

	pub fn not_found_reason(&self) -> Option<NotFoundReason> {
		match self {
			SearchOutcome::Found(_) => None,
			SearchOutcome::NotFound { reason, .. } => Some(*reason),
		}
	}

	pub fn stats(&self) -> &SearchStats {
		match self {
			SearchOutcome::Found(result) => &result.stats,
			SearchOutcome::NotFound { stats, .. } => stats,
		}
	}

	pub fn into_result(self) -> Option<SearchResult> {
		match self {
			SearchOutcome::Found(result) => Some(result),
			SearchOutcome::NotFound { .. } => None,
		}
	}
}

/// Open-set entry. "Greater" pops first: lower f, then lower g, then older.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
	f: f64,
	g: f64,
	seq: u64,
	node: NodeRef,
}

impl PartialEq for OpenEntry {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		// Reverse ordering for min-heap behavior
		other
			.f
			.total_cmp(&self.f)
			.then_with(|| other.g.total_cmp(&self.g))
			.then_with(|| other.seq.cmp(&self.seq))
	}
}

impl PartialOrd for OpenEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// A* search over one octree version. Read-only: any number of searches
/// may run concurrently on the same octree and graph.
pub struct PathSearch<'a> {
	octree: &'a Octree,
	graph: &'a AdjacencyGraph,
	config: SearchConfig,
}

impl<'a> PathSearch<'a> {
	pub fn new(octree: &'a Octree, graph: &'a AdjacencyGraph, config: SearchConfig) -> Self {
		Self { octree, graph, config }
	}

	/// Find a path between two points in the octree's local frame.
	///
	/// Fails with `PointOutsideBounds` / `PointInBlockedNode` when an
	/// endpoint cannot be placed in a Free leaf, and with `InvalidConfig`
	/// for weights that would break the open-set ordering.
	#[tracing::instrument(skip_all, name = "search::find_path")]
	pub fn find_path(&self, start: DVec3, goal: DVec3) -> NavResult<SearchOutcome> {
		self.config.validate()?;
		let started = Instant::now();
		let start_leaf = self.octree.locate_free_leaf(start)?;
		let goal_leaf = self.octree.locate_free_leaf(goal)?;
		let goal_center = self.octree.node_center(goal_leaf);
		let heuristic = |node: NodeRef| {
			self.config.estimate_weight
				* self.size_factor(node)
				* self.config.heuristic.estimate(self.octree.node_center(node), goal_center)
		};

		let mut stats = SearchStats::default();
		let mut open = BinaryHeap::new();
		let mut best_g: HashMap<NodeRef, f64> = HashMap::new();
		let mut came_from: HashMap<NodeRef, NodeRef> = HashMap::new();
		let mut closed: HashSet<NodeRef> = HashSet::new();
		let mut seq = 0u64;

		best_g.insert(start_leaf, 0.0);
		open.push(OpenEntry {
			f: heuristic(start_leaf),
			g: 0.0,
			seq,
			node: start_leaf,
		});
		stats.pushed += 1;

		while let Some(entry) = open.pop() {
			if closed.contains(&entry.node) {
				continue;
			}

			if entry.node == goal_leaf {
				let nodes = reconstruct(&came_from, start_leaf, goal_leaf);
				let raw_path = self.waypoints(&nodes, start, goal);
				stats.elapsed_us = started.elapsed().as_micros() as u64;
				tracing::debug!(
					expanded = stats.expanded,
					nodes = nodes.len(),
					cost = entry.g,
					"path found"
				);
				return Ok(SearchOutcome::Found(SearchResult {
					path: raw_path.clone(),
					raw_path,
					nodes,
					cost: entry.g,
					stats,
				}));
			}

			if !self.config.budget.can_expand(stats.expanded) {
				return Ok(self.not_found(NotFoundReason::ExpansionLimit, stats, started));
			}
			if let Some(timeout) = self.config.budget.timeout {
				if stats.expanded % TIMEOUT_CHECK_INTERVAL == 0 && started.elapsed() >= timeout {
					return Ok(self.not_found(NotFoundReason::TimedOut, stats, started));
				}
			}

			closed.insert(entry.node);
			stats.expanded += 1;
			tracing::trace!(node = %entry.node, g = entry.g, f = entry.f, "expand");

			let step_factor = self.size_factor(entry.node);
			for link in self.graph.links(entry.node) {
				if closed.contains(&link.to) {
					continue;
				}
				let g = entry.g + self.config.unit_cost.unwrap_or(link.cost) * step_factor;
				if best_g.get(&link.to).map_or(true, |&known| g < known) {
					best_g.insert(link.to, g);
					came_from.insert(link.to, entry.node);
					seq += 1;
					open.push(OpenEntry {
						f: g + heuristic(link.to),
						g,
						seq,
						node: link.to,
					});
					stats.pushed += 1;
				}
			}
		}

		Ok(self.not_found(NotFoundReason::Disconnected, stats, started))
	}

	/// Cost multiplier for a leaf: 1 at the voxel layer, shrinking toward
	/// the root by `node_size_preference`, never below 0.
	#[inline]
	fn size_factor(&self, node: NodeRef) -> f64 {
		if self.config.node_size_preference == 0.0 {
			return 1.0;
		}
		let max_depth = self.octree.max_depth();
		let coarseness = max_depth.saturating_sub(node.layer) as f64 / (max_depth as f64 + 1.0);
		(1.0 - coarseness * self.config.node_size_preference).max(0.0)
	}

	fn not_found(&self, reason: NotFoundReason, mut stats: SearchStats, started: Instant) -> SearchOutcome {
		stats.elapsed_us = started.elapsed().as_micros() as u64;
		tracing::debug!(?reason, expanded = stats.expanded, "no path");
		SearchOutcome::NotFound { reason, stats }
	}

	/// Exact start, every leaf center along the chain, exact goal.
	///
	/// Each segment lies inside one Free leaf or inside two touching ones,
	/// so the raw chain never crosses blocked space. A center equal to its
	/// endpoint is not repeated.
	fn waypoints(&self, nodes: &[NodeRef], start: DVec3, goal: DVec3) -> NavPath {
		let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
			return NavPath::default();
		};

		let mut points = Vec::with_capacity(nodes.len() + 2);
		points.push(PathPoint::new(start, first.layer));
		if nodes.len() > 1 {
			for &n in nodes {
				let center = self.octree.node_center(n);
				if center != start && center != goal {
					points.push(PathPoint::new(center, n.layer));
				}
			}
		}
		points.push(PathPoint::new(goal, last.layer));
		NavPath::new(points)
	}
}

/// Node chain from `start` to `goal` through recorded parents.
fn reconstruct(came_from: &HashMap<NodeRef, NodeRef>, start: NodeRef, goal: NodeRef) -> Vec<NodeRef> {
	let mut nodes = vec![goal];
	let mut current = goal;
	while current != start {
		match came_from.get(&current) {
			Some(&parent) => {
				nodes.push(parent);
				current = parent;
			}
			None => break,
		}
	}
	nodes.reverse();
	nodes
}

/// Convenience wrapper around [`PathSearch`].
pub fn find_path(
	octree: &Octree,
	graph: &AdjacencyGraph,
	start: DVec3,
	goal: DVec3,
	config: &SearchConfig,
) -> NavResult<SearchOutcome> {
	PathSearch::new(octree, graph, *config).find_path(start, goal)
}

#[cfg(test)]
#[path = "astar_test.rs"]
mod astar_test;
