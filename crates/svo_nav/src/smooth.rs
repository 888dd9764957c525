//! Post-processing of raw search paths.
//!
//! - String pulling: drop waypoints the agent can skip in a straight line
//! - Catmull-Rom densification for curved motion, kept only when every
//!   curve segment is unobstructed

use glam::DVec3;

use crate::error::NavResult;
use crate::path::{NavPath, PathPoint};
use crate::probe::CollisionProbe;

/// How waypoints are pruned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PruningMode {
	/// Keep the raw node chain.
	None,
	/// Line-of-sight checks with a zero-radius segment.
	#[default]
	WithoutClearance,
	/// Line-of-sight checks with a swept sphere of `clearance` radius.
	WithClearance,
}

/// Smoothing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothingConfig {
	pub mode: PruningMode,
	/// Sweep radius used by `PruningMode::WithClearance`.
	pub clearance: f64,
	/// Spline points per segment (0 = no spline).
	pub spline_subdivisions: u32,
}

impl SmoothingConfig {
	/// Raw paths, untouched.
	pub const RAW: Self = Self {
		mode: PruningMode::None,
		clearance: 0.0,
		spline_subdivisions: 0,
	};

	pub fn with_mode(mut self, mode: PruningMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn with_clearance(mut self, clearance: f64) -> Self {
		self.clearance = clearance;
		self
	}

	pub fn with_spline(mut self, spline_subdivisions: u32) -> Self {
		self.spline_subdivisions = spline_subdivisions;
		self
	}

	/// Raise the `WithClearance` sweep radius to at least `clearance`.
	pub fn with_min_clearance(mut self, clearance: f64) -> Self {
		if self.mode == PruningMode::WithClearance {
			self.clearance = self.clearance.max(clearance);
		}
		self
	}

	#[inline]
	fn sweep_radius(&self) -> f64 {
		match self.mode {
			PruningMode::WithClearance => self.clearance.max(0.0),
			PruningMode::None | PruningMode::WithoutClearance => 0.0,
		}
	}
}

impl Default for SmoothingConfig {
	fn default() -> Self {
		Self {
			mode: PruningMode::WithoutClearance,
			clearance: 0.0,
			spline_subdivisions: 0,
		}
	}
}

/// Path smoother backed by the host's segment queries.
pub struct PathSmoother<'a, P: CollisionProbe + ?Sized> {
	probe: &'a P,
	config: SmoothingConfig,
}

impl<'a, P: CollisionProbe + ?Sized> PathSmoother<'a, P> {
	pub fn new(probe: &'a P, config: SmoothingConfig) -> Self {
		Self { probe, config }
	}

	pub fn config(&self) -> &SmoothingConfig {
		&self.config
	}

	/// Prune, then densify when a spline is configured.
	pub fn apply(&self, raw: &NavPath) -> NavResult<NavPath> {
		let pruned = self.smooth(raw)?;
		if self.config.spline_subdivisions == 0 {
			return Ok(pruned);
		}
		self.spline(&pruned)
	}

	/// String pulling in a single forward pass.
	///
	/// From each anchor, jump to the farthest later waypoint with a clear
	/// segment; keep the next waypoint when none is visible. First and last
	/// points are kept exactly and the point count never grows.
	pub fn smooth(&self, raw: &NavPath) -> NavResult<NavPath> {
		if raw.len() <= 2 || self.config.mode == PruningMode::None {
			return Ok(raw.clone());
		}

		let radius = self.config.sweep_radius();
		let points = &raw.points;
		let mut pruned = vec![points[0]];
		let mut anchor = 0;

		while anchor < points.len() - 1 {
			let mut next = anchor + 1;
			for candidate in (anchor + 2..points.len()).rev() {
				if !self.probe.is_segment_blocked(points[anchor].position, points[candidate].position, radius)? {
					next = candidate;
					break;
				}
			}
			pruned.push(points[next]);
			anchor = next;
		}

		tracing::trace!(raw = raw.len(), pruned = pruned.len(), "path pruned");
		Ok(NavPath::new(pruned))
	}

	/// Catmull-Rom densification with `spline_subdivisions` points per
	/// segment. Returns the input unchanged when any curve piece is blocked.
	pub fn spline(&self, path: &NavPath) -> NavResult<NavPath> {
		let subdivisions = self.config.spline_subdivisions;
		if path.len() < 2 || subdivisions == 0 {
			return Ok(path.clone());
		}

		let radius = self.config.sweep_radius();
		let points = &path.points;
		let last = points.len() - 1;
		let at = |i: isize| points[i.clamp(0, last as isize) as usize].position;

		let mut curve = vec![points[0]];
		for seg in 0..last {
			let i = seg as isize;
			let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
			let layer = points[seg].layer;
			for step in 1..=subdivisions {
				let position = if step == subdivisions {
					p2
				} else {
					catmull_rom(p0, p1, p2, p3, step as f64 / subdivisions as f64)
				};
				let prev = curve[curve.len() - 1].position;
				if self.probe.is_segment_blocked(prev, position, radius)? {
					tracing::debug!(segment = seg, "spline blocked, keeping polyline");
					return Ok(path.clone());
				}
				let layer = if step == subdivisions { points[seg + 1].layer } else { layer };
				curve.push(PathPoint::new(position, layer));
			}
		}

		Ok(NavPath::new(curve))
	}
}

/// Uniform Catmull-Rom point between `p1` (t = 0) and `p2` (t = 1).
#[inline]
fn catmull_rom(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3, t: f64) -> DVec3 {
	let t2 = t * t;
	let t3 = t2 * t;
	0.5 * ((2.0 * p1)
		+ (p2 - p0) * t
		+ (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
		+ (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
#[path = "smooth_test.rs"]
mod smooth_test;
