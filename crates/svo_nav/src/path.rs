//! Navigation paths returned to callers.

use glam::DVec3;

/// One waypoint.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPoint {
  pub position: DVec3,
  /// Octree layer of the leaf the waypoint came from.
  pub layer: u8,
}

impl PathPoint {
  pub fn new(position: DVec3, layer: u8) -> Self {
    Self { position, layer }
  }
}

/// Ordered waypoints from start to goal. Owned by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavPath {
  pub points: Vec<PathPoint>,
}

impl NavPath {
  pub fn new(points: Vec<PathPoint>) -> Self {
    Self { points }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn first(&self) -> Option<&PathPoint> {
    self.points.first()
  }

  pub fn last(&self) -> Option<&PathPoint> {
    self.points.last()
  }

  pub fn positions(&self) -> impl Iterator<Item = DVec3> + '_ {
    self.points.iter().map(|p| p.position)
  }

  /// Polyline length.
  pub fn length(&self) -> f64 {
    self
      .points
      .windows(2)
      .map(|w| w[0].position.distance(w[1].position))
      .sum()
  }

  /// Same path with every position mapped (e.g. local to world frame).
  pub fn map_positions(&self, mut f: impl FnMut(DVec3) -> DVec3) -> Self {
    Self {
      points: self
        .points
        .iter()
        .map(|p| PathPoint::new(f(p.position), p.layer))
        .collect(),
    }
  }
}
