use std::collections::BTreeSet;

use glam::{DVec3, UVec3};

use super::*;
use crate::octree::{OctreeBuilder, NodeState};
use crate::probes::BoxWorld;
use crate::test_utils::{build, cell_aabb, root, uniform_grid, SharedWorld, SubdividingProbe};

const HALF: f64 = 500.0;

fn pillar_world() -> BoxWorld {
  BoxWorld::new()
    .with_box(cell_aabb(HALF, 3, UVec3::new(1, 1, 1)))
    .with_box(DAabb3::new(DVec3::new(-30.0, -500.0, -30.0), DVec3::new(30.0, 200.0, 30.0)))
}

fn cell_ref(octree: &Octree, depth: u8, cell: UVec3) -> NodeRef {
  octree.find(depth, morton::encode(cell)).expect("cell exists")
}

// =========================================================================
// Batch 1: Touching Leaves Tests
// =========================================================================

/// An interior cell of a uniform grid touches exactly its 26 neighbors.
#[test]
fn test_touching_uniform_interior() {
  let octree = uniform_grid(HALF, 2);
  let node = cell_ref(&octree, 2, UVec3::new(1, 1, 2));
  let touching = touching_leaves(&octree, node);

  assert_eq!(touching.len(), 26);
  assert!(touching.windows(2).all(|w| w[0] < w[1]), "sorted and deduplicated");
  assert!(!touching.contains(&node));
}

/// A coarse leaf beside a subdivided region touches the fine leaves on
/// the shared face once each.
#[test]
fn test_touching_across_depths() {
  let world = BoxWorld::new().with_box(cell_aabb(HALF, 2, UVec3::ZERO));
  let (octree, _) = build(&world, HALF, 2);

  let coarse = cell_ref(&octree, 1, UVec3::new(1, 0, 0));
  let fine: Vec<NodeRef> = touching_leaves(&octree, coarse)
    .into_iter()
    .filter(|r| r.layer == 2)
    .collect();

  assert_eq!(fine.len(), 4);
  for r in &fine {
    let cell = morton::decode(octree.node(*r).morton);
    assert_eq!(cell.x, 1, "only the +X half of octant 0 borders the coarse leaf");
  }
}

// =========================================================================
// Batch 2: Link Structure Tests
// =========================================================================

/// Without obstacles every cost is the exact center distance.
#[test]
fn test_uniform_grid_links() {
  let octree = uniform_grid(HALF, 2);
  let graph = LinkResolver::default().resolve(&octree);

  let interior = cell_ref(&octree, 2, UVec3::new(2, 1, 2));
  let corner = cell_ref(&octree, 2, UVec3::new(3, 3, 3));
  assert_eq!(graph.links(interior).len(), 26);
  assert_eq!(graph.links(corner).len(), 7);

  for (from, link) in graph.iter() {
    let d = octree.node_center(from).distance(octree.node_center(link.to));
    assert_eq!(link.cost, d);
  }
  assert_eq!(graph.clearance(interior), None);
}

/// Adjacency is symmetric even though costs are directional.
#[test]
fn test_links_are_symmetric() {
  let (octree, _) = build(&pillar_world(), HALF, 4);
  let graph = LinkResolver::default().resolve(&octree);

  let edges: BTreeSet<(NodeRef, NodeRef)> = graph.iter().map(|(from, l)| (from, l.to)).collect();
  for &(a, b) in &edges {
    assert!(edges.contains(&(b, a)), "missing reverse link {b} -> {a}");
  }
}

/// Fine leaves link to the coarse leaf (many-to-one) and back (one-to-many).
#[test]
fn test_cross_depth_links() {
  let world = BoxWorld::new().with_box(cell_aabb(HALF, 2, UVec3::ZERO));
  let (octree, _) = build(&world, HALF, 2);
  let graph = LinkResolver::default().resolve(&octree);

  let coarse = cell_ref(&octree, 1, UVec3::new(1, 0, 0));
  let fine = cell_ref(&octree, 2, UVec3::new(1, 1, 1));

  assert!(graph.links(fine).iter().any(|l| l.to == coarse));
  assert!(graph.links(coarse).iter().any(|l| l.to == fine));
  let to_coarse = graph.links(fine).iter().filter(|l| l.to == coarse).count();
  assert_eq!(to_coarse, 1, "deduplicated per pair");
}

/// Blocked leaves have no outgoing and no incoming links.
#[test]
fn test_blocked_leaves_never_linked() {
  let (octree, _) = build(&pillar_world(), HALF, 4);
  let graph = LinkResolver::default().resolve(&octree);

  assert!(graph.link_count() > 0);
  for (from, link) in graph.iter() {
    assert_eq!(octree.node(from).state, NodeState::Free);
    assert_eq!(octree.node(link.to).state, NodeState::Free);
  }
  for r in octree.leaves().filter(|&r| octree.node(r).is_blocked()) {
    assert!(graph.links(r).is_empty());
  }
}

/// Every cost is finite and at least the center distance.
#[test]
fn test_cost_at_least_distance() {
  let (octree, _) = build(&pillar_world(), HALF, 4);
  let graph = LinkResolver::new(3.0).resolve(&octree);

  for (from, link) in graph.iter() {
    let d = octree.node_center(from).distance(octree.node_center(link.to));
    assert!(link.cost.is_finite());
    assert!(link.cost >= d);
  }
}

/// Links into leaves next to obstacles cost more when weighted.
#[test]
fn test_clearance_penalty() {
  let world = BoxWorld::new().with_box(cell_aabb(HALF, 2, UVec3::ZERO));
  let (octree, _) = build(&world, HALF, 2);

  let near = cell_ref(&octree, 2, UVec3::new(1, 0, 0));
  let from = cell_ref(&octree, 2, UVec3::new(1, 1, 0));
  assert_eq!(
    LinkResolver::new(1.0).resolve(&octree).clearance(near),
    Some(125.0)
  );

  let cost_to = |weight: f64| {
    LinkResolver::new(weight)
      .resolve(&octree)
      .links(from)
      .iter()
      .find(|l| l.to == near)
      .map(|l| l.cost)
      .expect("face link")
  };
  assert_eq!(cost_to(0.0), 250.0);
  // h / (h + c) = 125 / 250
  assert_eq!(cost_to(1.0), 250.0 * 1.5);
}

// =========================================================================
// Batch 3: Determinism Tests
// =========================================================================

/// Resolving the same octree twice yields equal graphs.
#[test]
fn test_resolve_idempotent() {
  let (octree, _) = build(&pillar_world(), HALF, 4);
  let resolver = LinkResolver::default();
  assert_eq!(resolver.resolve(&octree), resolver.resolve(&octree));
}

// =========================================================================
// Batch 4: Incremental Resolve Tests
// =========================================================================

/// Incremental re-resolve after a rebuild equals a full resolve.
#[test]
fn test_incremental_matches_full() {
  let world = SharedWorld::new(pillar_world());
  let builder = OctreeBuilder::new(&world, 0.0);
  let resolver = LinkResolver::new(2.0);

  let (before, _) = builder.build(root(HALF), 4).expect("build succeeds");
  let before_graph = resolver.resolve(&before);

  let added = DAabb3::new(DVec3::new(100.0, 120.0, -200.0), DVec3::new(180.0, 300.0, -90.0));
  world.add_box(added);
  let (after, _) = builder.rebuild(&before, &added).expect("rebuild succeeds");

  let incremental = resolver.resolve_incremental(&before, &before_graph, &after, &added);
  assert_eq!(incremental, resolver.resolve(&after));
}

/// Removing an obstacle is handled the same way.
#[test]
fn test_incremental_after_removal_matches_full() {
  let world = SharedWorld::new(pillar_world());
  let builder = OctreeBuilder::new(&world, 0.0);
  let resolver = LinkResolver::default();

  let (before, _) = builder.build(root(HALF), 4).expect("build succeeds");
  let before_graph = resolver.resolve(&before);

  let cube = cell_aabb(HALF, 3, UVec3::new(1, 1, 1));
  {
    let mut guard = world.world.write().unwrap();
    let remaining: Vec<DAabb3> = guard.boxes().iter().copied().filter(|b| *b != cube).collect();
    *guard = BoxWorld::from_boxes(remaining);
  }
  let (after, _) = builder.rebuild(&before, &cube).expect("rebuild succeeds");

  let incremental = resolver.resolve_incremental(&before, &before_graph, &after, &cube);
  assert_eq!(incremental, resolver.resolve(&after));
}

/// A region that becomes fully blocked loses exactly the links touching it.
#[test]
fn test_blocking_region_removes_only_its_links() {
  let probe = SubdividingProbe::new(SharedWorld::default(), HALF / 8.0);
  let builder = OctreeBuilder::new(&probe, 0.0);
  let resolver = LinkResolver::new(0.0);

  let (before, _) = builder.build(root(HALF), 3).expect("build succeeds");
  let before_graph = resolver.resolve(&before);

  let region = cell_aabb(HALF, 3, UVec3::new(3, 4, 2));
  probe.inner.add_box(region);
  let (after, _) = builder.rebuild(&before, &region).expect("rebuild succeeds");
  let after_graph = resolver.resolve_incremental(&before, &before_graph, &after, &region);

  let blocked_key = NodeKey {
    depth: 3,
    morton: morton::encode(UVec3::new(3, 4, 2)),
  };
  let old_edges = before_graph.edge_map(&before);
  let new_edges = after_graph.edge_map(&after);

  let expected: BTreeMap<(NodeKey, NodeKey), f64> = old_edges
    .iter()
    .filter(|((a, b), _)| *a != blocked_key && *b != blocked_key)
    .map(|(k, v)| (*k, *v))
    .collect();
  assert_eq!(new_edges, expected);
  assert_eq!(old_edges.len() - new_edges.len(), 2 * 26);
}
