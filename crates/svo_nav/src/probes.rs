//! Reference collision probes.
//!
//! Self-contained worlds for tests, benchmarks and the CLI: no host engine
//! needed.
//!
//! - [`EmptyWorld`]: nothing is ever blocked
//! - [`BoxWorld`]: a set of solid axis-aligned boxes with exact coverage
//!   ratios and swept-segment tests

use glam::DVec3;

use crate::error::ProbeError;
use crate::octree::DAabb3;
use crate::probe::CollisionProbe;

// =============================================================================
// EmptyWorld
// =============================================================================

/// A world without obstacles.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyWorld;

impl CollisionProbe for EmptyWorld {
  fn is_box_blocked(&self, _center: DVec3, _half_extent: f64) -> Result<bool, ProbeError> {
    Ok(false)
  }

  fn occupancy_ratio(&self, _center: DVec3, _half_extent: f64) -> Result<Option<f64>, ProbeError> {
    Ok(Some(0.0))
  }

  fn is_segment_blocked(&self, _from: DVec3, _to: DVec3, _radius: f64) -> Result<bool, ProbeError> {
    Ok(false)
  }
}

// =============================================================================
// BoxWorld
// =============================================================================

/// Solid axis-aligned boxes.
///
/// Touching a box face is not a collision: only positive-volume overlap
/// blocks a query cube, and segments must pass through a box interior.
#[derive(Clone, Debug, Default)]
pub struct BoxWorld {
  boxes: Vec<DAabb3>,
}

impl BoxWorld {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_boxes(boxes: impl IntoIterator<Item = DAabb3>) -> Self {
    Self {
      boxes: boxes.into_iter().collect(),
    }
  }

  /// Builder: add one obstacle.
  pub fn with_box(mut self, aabb: DAabb3) -> Self {
    self.boxes.push(aabb);
    self
  }

  pub fn add_box(&mut self, aabb: DAabb3) {
    self.boxes.push(aabb);
  }

  pub fn boxes(&self) -> &[DAabb3] {
    &self.boxes
  }

  pub fn clear(&mut self) {
    self.boxes.clear();
  }
}

impl CollisionProbe for BoxWorld {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    let query = DAabb3::from_center_half_extents(center, DVec3::splat(half_extent));
    Ok(self.boxes.iter().any(|b| b.overlap_volume(&query) > 0.0))
  }

  /// 1 when a single box swallows the cube, 0 without overlap, otherwise
  /// the largest single-box coverage clamped below 1.
  ///
  /// Several boxes jointly covering the cube report as partial; the
  /// classifier then subdivides instead of misreporting free space.
  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    let query = DAabb3::from_center_half_extents(center, DVec3::splat(half_extent));
    let volume = query.volume();
    if volume <= 0.0 {
      return Ok(Some(if self.boxes.iter().any(|b| b.contains_point(center)) { 1.0 } else { 0.0 }));
    }

    let mut best = 0.0f64;
    for b in &self.boxes {
      if b.contains_aabb(&query) {
        return Ok(Some(1.0));
      }
      best = best.max(b.overlap_volume(&query) / volume);
    }
    Ok(Some(best.min(0.999)))
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    Ok(self
      .boxes
      .iter()
      .any(|b| segment_hits_interior(from, to, &b.expanded(radius.max(0.0)))))
  }
}

/// Slab test against the open interior of `aabb`.
fn segment_hits_interior(from: DVec3, to: DVec3, aabb: &DAabb3) -> bool {
  let dir = to - from;
  let mut t_enter = 0.0f64;
  let mut t_exit = 1.0f64;

  for axis in 0..3 {
    let (origin, delta, min, max) = (from[axis], dir[axis], aabb.min[axis], aabb.max[axis]);
    if delta == 0.0 {
      if origin <= min || origin >= max {
        return false;
      }
      continue;
    }
    let t0 = (min - origin) / delta;
    let t1 = (max - origin) / delta;
    let (near, far) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
    t_enter = t_enter.max(near);
    t_exit = t_exit.min(far);
    if t_enter >= t_exit {
      return false;
    }
  }
  true
}
