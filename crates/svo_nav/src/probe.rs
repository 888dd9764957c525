//! Seams to the host engine: collision queries and coordinate frames.
//!
//! The navigation code never talks to a physics engine directly. Hosts
//! implement [`CollisionProbe`] over whatever collision system they own and
//! hand it to the builder and smoother.

use std::sync::Arc;

use glam::{DAffine3, DVec3};

use crate::error::ProbeError;

/// The default segment march never issues more than
/// `2 * SEGMENT_MARCH_STEPS + 1` box queries.
const SEGMENT_MARCH_STEPS: usize = 64;

/// Collision queries against the host world, expressed in the volume's local frame.
///
/// Implementations must be deterministic for a fixed world state and safe
/// to call from several threads at once.
pub trait CollisionProbe: Send + Sync {
  /// True if any obstacle overlaps the axis-aligned cube.
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError>;

  /// Fraction of the cube covered by obstacles, if the probe can tell.
  ///
  /// `None` means "boolean only": the classifier then treats any overlap
  /// as partial coverage and subdivides.
  fn occupancy_ratio(&self, _center: DVec3, _half_extent: f64) -> Result<Option<f64>, ProbeError> {
    Ok(None)
  }

  /// True if a sphere of `radius` swept from `from` to `to` hits an obstacle.
  ///
  /// The default marches overlapping cubes along the segment. Cubes are
  /// never thinner than the segment split into `2 * SEGMENT_MARCH_STEPS`
  /// pieces, so tiny radii stay bounded and report conservatively.
  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    let length = from.distance(to);
    if length == 0.0 {
      return self.is_box_blocked(from, radius.max(0.0));
    }
    let half = radius.max(length / (2 * SEGMENT_MARCH_STEPS) as f64);

    let steps = ((length / half).ceil() as usize).max(1);
    for i in 0..=steps {
      let t = i as f64 / steps as f64;
      if self.is_box_blocked(from.lerp(to, t), half)? {
        return Ok(true);
      }
    }
    Ok(false)
  }
}

impl<P: CollisionProbe + ?Sized> CollisionProbe for &P {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    (**self).is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    (**self).occupancy_ratio(center, half_extent)
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    (**self).is_segment_blocked(from, to, radius)
  }
}

impl<P: CollisionProbe + ?Sized> CollisionProbe for Arc<P> {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    (**self).is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    (**self).occupancy_ratio(center, half_extent)
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    (**self).is_segment_blocked(from, to, radius)
  }
}

impl<P: CollisionProbe + ?Sized> CollisionProbe for Box<P> {
  fn is_box_blocked(&self, center: DVec3, half_extent: f64) -> Result<bool, ProbeError> {
    (**self).is_box_blocked(center, half_extent)
  }

  fn occupancy_ratio(&self, center: DVec3, half_extent: f64) -> Result<Option<f64>, ProbeError> {
    (**self).occupancy_ratio(center, half_extent)
  }

  fn is_segment_blocked(&self, from: DVec3, to: DVec3, radius: f64) -> Result<bool, ProbeError> {
    (**self).is_segment_blocked(from, to, radius)
  }
}

/// Mapping between the host's world frame and the volume's local frame.
pub trait CoordinateTransform: Send + Sync {
  fn world_to_local(&self, world: DVec3) -> DVec3;
  fn local_to_world(&self, local: DVec3) -> DVec3;
}

/// Local frame == world frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl CoordinateTransform for Identity {
  #[inline]
  fn world_to_local(&self, world: DVec3) -> DVec3 {
    world
  }

  #[inline]
  fn local_to_world(&self, local: DVec3) -> DVec3 {
    local
  }
}

/// The affine maps local to world.
impl CoordinateTransform for DAffine3 {
  #[inline]
  fn world_to_local(&self, world: DVec3) -> DVec3 {
    self.inverse().transform_point3(world)
  }

  #[inline]
  fn local_to_world(&self, local: DVec3) -> DVec3 {
    self.transform_point3(local)
  }
}
