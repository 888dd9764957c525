//! Test utilities shared across modules.
//!
//! Mock probes with controllable behavior plus fixture builders.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use glam::{DVec3, UVec3};

use crate::error::ProbeError;
use crate::octree::{BuildStats, CubeBounds, DAabb3, Octree, OctreeBuilder};
use crate::probe::CollisionProbe;
use crate::probes::BoxWorld;

// =============================================================================
// Mock Probes
// =============================================================================

/// Hides the inner probe's occupancy ratio (boolean-only probe).
pub struct BooleanOnly<P>(pub P);

impl<P: CollisionProbe> CollisionProbe for BooleanOnly<P> {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    self.0.is_box_blocked(center, half_extent)
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    self.0.is_segment_blocked(from, to, radius)
  }
}

/// Always unavailable.
pub struct FailingProbe;

impl CollisionProbe for FailingProbe {
  fn is_box_blocked(&self, _center: DVec3, _half_extent: f64) -> Result<bool, ProbeError> {
    Err(ProbeError::new("scene not loaded"))
  }
}

/// Reports free cubes larger than `min_half_extent` as partially covered,
/// forcing a uniform grid down to that size wherever the inner world is empty.
pub struct SubdividingProbe<P> {
  pub inner: P,
  pub min_half_extent: f64,
}

impl<P> SubdividingProbe<P> {
  pub fn new(inner: P, min_half_extent: f64) -> Self {
    Self {
      inner,
      min_half_extent,
    }
  }
}

impl<P: CollisionProbe> CollisionProbe for SubdividingProbe<P> {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    self.inner.is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    let ratio = self.inner.occupancy_ratio(center, half_extent)?;
    Ok(match ratio {
      Some(r) if r <= 0.0 && half_extent > self.min_half_extent * (1.0 + 1e-9) => Some(0.5),
      other => other,
    })
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    self.inner.is_segment_blocked(from, to, radius)
  }
}

/// Like [`SubdividingProbe`], but only refines cubes overlapping `region`;
/// free space elsewhere stays as coarse as the inner world allows.
pub struct RefinedRegion<P> {
  pub inner: P,
  pub region: DAabb3,
  pub min_half_extent: f64,
}

impl<P> RefinedRegion<P> {
  pub fn new(inner: P, region: DAabb3, min_half_extent: f64) -> Self {
    Self {
      inner,
      region,
      min_half_extent,
    }
  }
}

impl<P: CollisionProbe> CollisionProbe for RefinedRegion<P> {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    self.inner.is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    let ratio = self.inner.occupancy_ratio(center, half_extent)?;
    let cube = DAabb3::from_center_half_extents(center, DVec3::splat(half_extent));
    Ok(match ratio {
      Some(r)
        if r <= 0.0
          && half_extent > self.min_half_extent * (1.0 + 1e-9)
          && self.region.overlap_volume(&cube) > 0.0 =>
      {
        Some(0.5)
      }
      other => other,
    })
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    self.inner.is_segment_blocked(from, to, radius)
  }
}

/// Counts every probe query.
pub struct CountingProbe<P> {
  pub inner: P,
  pub calls: AtomicUsize,
}

impl<P> CountingProbe<P> {
  pub fn new(inner: P) -> Self {
    Self {
      inner,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::Relaxed)
  }
}

impl<P: CollisionProbe> CollisionProbe for CountingProbe<P> {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    self.calls.fetch_add(1, Ordering::Relaxed);
    self.inner.is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    self.calls.fetch_add(1, Ordering::Relaxed);
    self.inner.occupancy_ratio(center, half_extent)
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    self.calls.fetch_add(1, Ordering::Relaxed);
    self.inner.is_segment_blocked(from, to, radius)
  }
}

/// Mutable box world shared with a volume; can be switched to failing.
#[derive(Default)]
pub struct SharedWorld {
  pub world: RwLock<BoxWorld>,
  pub failing: AtomicBool,
}

impl SharedWorld {
  pub fn new(world: BoxWorld) -> Self {
    Self {
      world: RwLock::new(world),
      failing: AtomicBool::new(false),
    }
  }

  pub fn add_box(&self, aabb: DAabb3) {
    self.world.write().unwrap().add_box(aabb);
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::Relaxed);
  }

  fn check(&self) -> Result<(), ProbeError> {
    if self.failing.load(Ordering::Relaxed) {
      Err(ProbeError::new("physics scene locked"))
    } else {
      Ok(())
    }
  }
}

impl CollisionProbe for SharedWorld {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    self.check()?;
    self.world.read().unwrap().is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    self.check()?;
    self.world.read().unwrap().occupancy_ratio(center, half_extent)
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    self.check()?;
    self.world.read().unwrap().is_segment_blocked(from, to, radius)
  }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Root cube of `half_extent` around the origin.
pub fn root(half_extent: f64) -> CubeBounds {
  CubeBounds::new(DVec3::ZERO, half_extent)
}

/// Build with zero clearance.
pub fn build<P: CollisionProbe>(probe: &P, half_extent: f64, max_depth: u8) -> (Octree, BuildStats) {
  OctreeBuilder::new(probe, 0.0)
    .build(root(half_extent), max_depth)
    .expect("build succeeds")
}

/// Free uniform grid of `2^depth` cells per axis.
pub fn uniform_grid(half_extent: f64, depth: u8) -> Octree {
  let probe = SubdividingProbe::new(BoxWorld::new(), half_extent / (1u64 << depth) as f64);
  build(&probe, half_extent, depth).0
}

/// Exact box of grid cell `cell` at `depth` inside a root of `half_extent`.
pub fn cell_aabb(half_extent: f64, depth: u8, cell: UVec3) -> DAabb3 {
  let size = 2.0 * half_extent / (1u64 << depth) as f64;
  let min = DVec3::splat(-half_extent) + cell.as_dvec3() * size;
  DAabb3::new(min, min + DVec3::splat(size))
}

/// Leaves partition the root: volumes sum to the root volume and no two
/// leaves overlap with positive volume.
pub fn assert_leaves_tile_root(octree: &Octree) {
  let leaves: Vec<DAabb3> = octree
    .leaves()
    .map(|r| octree.node_bounds(r).to_aabb())
    .collect();

  let total: f64 = leaves.iter().map(DAabb3::volume).sum();
  let root = octree.bounds().volume();
  assert!(
    ((total - root) / root).abs() < 1e-9,
    "leaf volume {total} != root volume {root}"
  );

  for (i, a) in leaves.iter().enumerate() {
    for b in &leaves[i + 1..] {
      assert_eq!(a.overlap_volume(b), 0.0, "leaves {a:?} and {b:?} overlap");
    }
  }
}
