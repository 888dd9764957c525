//! Occupancy classification of a single cube.

use std::cell::Cell;

use crate::error::NavResult;
use crate::octree::CubeBounds;
use crate::probe::CollisionProbe;

/// Coverage of a cube by obstacles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupancy {
  Free,
  Blocked,
  /// Partially covered, or the probe cannot tell. Needs subdivision.
  Mixed,
}

/// Classifies cubes through a [`CollisionProbe`].
///
/// Every cube is inflated by the agent clearance before probing, so a Free
/// leaf guarantees room for the agent anywhere inside it.
pub struct VoxelClassifier<'a, P: CollisionProbe + ?Sized> {
  probe: &'a P,
  clearance: f64,
  probe_calls: Cell<u64>,
}

impl<'a, P: CollisionProbe + ?Sized> VoxelClassifier<'a, P> {
  pub fn new(probe: &'a P, clearance: f64) -> Self {
    Self {
      probe,
      clearance,
      probe_calls: Cell::new(0),
    }
  }

  pub fn classify(&self, bounds: &CubeBounds) -> NavResult<Occupancy> {
    let probed = bounds.inflated(self.clearance);
    self.probe_calls.set(self.probe_calls.get() + 1);

    if let Some(ratio) = self.probe.occupancy_ratio(probed.center, probed.half_extent)? {
      return Ok(if ratio <= 0.0 {
        Occupancy::Free
      } else if ratio >= 1.0 {
        Occupancy::Blocked
      } else {
        Occupancy::Mixed
      });
    }

    self.probe_calls.set(self.probe_calls.get() + 1);
    Ok(if self.probe.is_box_blocked(probed.center, probed.half_extent)? {
      Occupancy::Mixed
    } else {
      Occupancy::Free
    })
  }

  /// Probe queries issued so far.
  pub fn probe_calls(&self) -> u64 {
    self.probe_calls.get()
  }

  pub fn clearance(&self) -> f64 {
    self.clearance
  }
}

#[cfg(test)]
mod tests {
  use glam::DVec3;

  use super::*;
  use crate::error::{NavError, ProbeError};
  use crate::octree::DAabb3;
  use crate::probes::{BoxWorld, EmptyWorld};
  use crate::test_utils::{BooleanOnly, FailingProbe};

  fn wall() -> BoxWorld {
    BoxWorld::new().with_box(DAabb3::new(DVec3::new(4.0, -100.0, -100.0), DVec3::new(6.0, 100.0, 100.0)))
  }

  #[test]
  fn empty_world_is_free() {
    let classifier = VoxelClassifier::new(&EmptyWorld, 0.0);
    let cube = CubeBounds::new(DVec3::ZERO, 10.0);
    assert_eq!(classifier.classify(&cube), Ok(Occupancy::Free));
    assert_eq!(classifier.probe_calls(), 1);
  }

  #[test]
  fn ratio_drives_classification() {
    let world = wall();
    let classifier = VoxelClassifier::new(&world, 0.0);

    assert_eq!(
      classifier.classify(&CubeBounds::new(DVec3::new(5.0, 0.0, 0.0), 1.0)),
      Ok(Occupancy::Blocked)
    );
    assert_eq!(
      classifier.classify(&CubeBounds::new(DVec3::new(4.0, 0.0, 0.0), 1.0)),
      Ok(Occupancy::Mixed)
    );
    assert_eq!(
      classifier.classify(&CubeBounds::new(DVec3::new(1.0, 0.0, 0.0), 1.0)),
      Ok(Occupancy::Free)
    );
  }

  #[test]
  fn clearance_inflates_probe_box() {
    let world = wall();
    let cube = CubeBounds::new(DVec3::new(2.5, 0.0, 0.0), 1.0);

    let tight = VoxelClassifier::new(&world, 0.0);
    assert_eq!(tight.classify(&cube), Ok(Occupancy::Free));

    let padded = VoxelClassifier::new(&world, 1.0);
    assert_eq!(padded.classify(&cube), Ok(Occupancy::Mixed));
  }

  #[test]
  fn boolean_probe_never_reports_blocked() {
    let world = BooleanOnly(wall());
    let classifier = VoxelClassifier::new(&world, 0.0);

    assert_eq!(
      classifier.classify(&CubeBounds::new(DVec3::new(5.0, 0.0, 0.0), 0.5)),
      Ok(Occupancy::Mixed)
    );
    assert_eq!(
      classifier.classify(&CubeBounds::new(DVec3::new(0.0, 0.0, 0.0), 1.0)),
      Ok(Occupancy::Free)
    );
  }

  #[test]
  fn probe_failure_propagates() {
    let classifier = VoxelClassifier::new(&FailingProbe, 0.0);
    let result = classifier.classify(&CubeBounds::new(DVec3::ZERO, 1.0));
    assert_eq!(
      result,
      Err(NavError::ProbeUnavailable(ProbeError::new("scene not loaded")))
    );
  }
}
