//! NavConfig - volume bounds, resolution and agent parameters.

use glam::DVec3;

use super::CubeBounds;
use crate::error::{NavError, NavResult};

/// Deepest supported layer. Morton codes hold 21 bits per axis; the cap
/// keeps per-layer grids and layer counts small.
pub const MAX_DEPTH: u8 = 16;

/// Configuration for building and maintaining one navigation volume.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavConfig {
  /// Root cube in the volume's local frame.
  pub bounds: CubeBounds,

  /// Finest layer. Leaf voxel edge = root edge / 2^max_depth.
  pub max_depth: u8,

  /// Agent radius. Classification inflates every node by this much.
  pub agent_clearance: f64,

  /// Weight of the clearance penalty in link costs (0 = pure distance).
  pub clearance_weight: f64,

  /// Extra margin added around every rebuild region.
  pub rebuild_padding: f64,
}

impl NavConfig {
  pub fn new(bounds: CubeBounds, max_depth: u8) -> Self {
    Self {
      bounds,
      max_depth,
      ..Self::default()
    }
  }

  /// Derive the layer count from a desired volume and leaf voxel size.
  ///
  /// `max_depth = round(log2(volume_size / voxel_size))`; the actual root
  /// edge is `voxel_size * 2^max_depth`, which may differ from the request.
  pub fn from_volume_size(center: DVec3, volume_size: f64, voxel_size: f64) -> NavResult<Self> {
    if !(voxel_size.is_finite() && voxel_size > 0.0) {
      return Err(NavError::InvalidConfig(format!(
        "voxel size must be positive and finite, got {voxel_size}"
      )));
    }
    if !(volume_size.is_finite() && volume_size > 0.0) {
      return Err(NavError::InvalidBounds {
        half_extent: volume_size * 0.5,
      });
    }

    let exponent = (volume_size / voxel_size).log2().round().clamp(0.0, MAX_DEPTH as f64) as u8;
    let actual = voxel_size * (1u64 << exponent) as f64;
    Ok(Self::new(CubeBounds::new(center, actual * 0.5), exponent))
  }

  pub fn with_clearance(mut self, agent_clearance: f64) -> Self {
    self.agent_clearance = agent_clearance;
    self
  }

  pub fn with_clearance_weight(mut self, clearance_weight: f64) -> Self {
    self.clearance_weight = clearance_weight;
    self
  }

  pub fn with_rebuild_padding(mut self, rebuild_padding: f64) -> Self {
    self.rebuild_padding = rebuild_padding;
    self
  }

  /// Check every field; the builder refuses to run on an invalid config.
  pub fn validate(&self) -> NavResult<()> {
    self.bounds.validate()?;
    if self.max_depth > MAX_DEPTH {
      return Err(NavError::InvalidConfig(format!(
        "max_depth {} exceeds {MAX_DEPTH}",
        self.max_depth
      )));
    }
    for (name, value) in [
      ("agent_clearance", self.agent_clearance),
      ("clearance_weight", self.clearance_weight),
      ("rebuild_padding", self.rebuild_padding),
    ] {
      if !(value.is_finite() && value >= 0.0) {
        return Err(NavError::InvalidConfig(format!(
          "{name} must be finite and non-negative, got {value}"
        )));
      }
    }
    Ok(())
  }

  /// Edge length of a node at `depth`.
  #[inline]
  pub fn cell_size(&self, depth: u8) -> f64 {
    self.bounds.size() / (1u64 << depth) as f64
  }

  /// Edge length of the finest voxels.
  #[inline]
  pub fn voxel_size(&self) -> f64 {
    self.cell_size(self.max_depth)
  }

  /// Number of layers (root included).
  #[inline]
  pub fn num_layers(&self) -> usize {
    self.max_depth as usize + 1
  }
}

impl Default for NavConfig {
  fn default() -> Self {
    Self {
      bounds: CubeBounds::new(DVec3::ZERO, 500.0),
      max_depth: 6,
      agent_clearance: 0.0,
      clearance_weight: 1.0,
      rebuild_padding: 0.0,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
