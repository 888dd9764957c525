//! Error taxonomy for octree builds and path queries.
//!
//! "No path exists" is not an error: it is reported as
//! [`SearchOutcome::NotFound`](crate::search::SearchOutcome::NotFound).

use glam::DVec3;
use thiserror::Error;

use crate::octree::NodeRef;

/// Failure reported by a [`CollisionProbe`](crate::probe::CollisionProbe).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("collision probe unavailable: {reason}")]
pub struct ProbeError {
  /// Human readable cause from the host collision system.
  pub reason: String,
}

impl ProbeError {
  pub fn new(reason: impl Into<String>) -> Self {
    Self {
      reason: reason.into(),
    }
  }
}

/// Errors from building, rebuilding or querying a navigation octree.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum NavError {
  /// Root bounds with non-positive or non-finite extent. Fatal to the build.
  #[error("invalid bounds: half extent {half_extent} must be positive and finite")]
  InvalidBounds { half_extent: f64 },

  /// Configuration value outside its supported range.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// The collision probe could not be queried. Never retried internally.
  #[error(transparent)]
  ProbeUnavailable(#[from] ProbeError),

  /// Query point outside the root bounds.
  #[error("point {point} lies outside the octree bounds")]
  PointOutsideBounds { point: DVec3 },

  /// Query point inside a blocked leaf.
  #[error("point {point} lies inside blocked node {node}")]
  PointInBlockedNode { point: DVec3, node: NodeRef },
}

pub type NavResult<T> = Result<T, NavError>;
