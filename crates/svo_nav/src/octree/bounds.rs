//! Double-precision boxes: cubic node bounds and axis-aligned regions.

use glam::DVec3;

use crate::error::{NavError, NavResult};

/// Cubic bounds of an octree node: center plus uniform half-extent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CubeBounds {
	pub center: DVec3,
	pub half_extent: f64,
}

impl CubeBounds {
	pub fn new(center: DVec3, half_extent: f64) -> Self {
		Self { center, half_extent }
	}

	/// Reject non-positive or non-finite extents and non-finite centers.
	pub fn validate(&self) -> NavResult<()> {
		if !(self.half_extent.is_finite() && self.half_extent > 0.0) || !self.center.is_finite() {
			return Err(NavError::InvalidBounds {
				half_extent: self.half_extent,
			});
		}
		Ok(())
	}

	#[inline]
	pub fn min(&self) -> DVec3 {
		self.center - DVec3::splat(self.half_extent)
	}

	#[inline]
	pub fn max(&self) -> DVec3 {
		self.center + DVec3::splat(self.half_extent)
	}

	/// Edge length.
	#[inline]
	pub fn size(&self) -> f64 {
		self.half_extent * 2.0
	}

	#[inline]
	pub fn volume(&self) -> f64 {
		let size = self.size();
		size * size * size
	}

	/// Bounds of one of the 8 children.
	///
	/// Octant bits: bit 0 = +X, bit 1 = +Y, bit 2 = +Z.
	pub fn child(&self, octant: u8) -> Self {
		let quarter = self.half_extent * 0.5;
		let offset = DVec3::new(
			if octant & 1 != 0 { quarter } else { -quarter },
			if octant & 2 != 0 { quarter } else { -quarter },
			if octant & 4 != 0 { quarter } else { -quarter },
		);
		Self {
			center: self.center + offset,
			half_extent: quarter,
		}
	}

	/// Octant of the child containing `point` (points on a split plane go to the + side).
	#[inline]
	pub fn octant_of(&self, point: DVec3) -> u8 {
		(point.x >= self.center.x) as u8
			| ((point.y >= self.center.y) as u8) << 1
			| ((point.z >= self.center.z) as u8) << 2
	}

	/// Inclusive containment test.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		self.to_aabb().contains_point(point)
	}

	/// Same cube grown by `margin` on every side.
	#[inline]
	pub fn inflated(&self, margin: f64) -> Self {
		Self {
			center: self.center,
			half_extent: self.half_extent + margin,
		}
	}

	/// Euclidean distance from `point` to the cube (0 when inside).
	pub fn distance_to_point(&self, point: DVec3) -> f64 {
		let d = ((point - self.center).abs() - DVec3::splat(self.half_extent)).max(DVec3::ZERO);
		d.length()
	}

	#[inline]
	pub fn to_aabb(&self) -> DAabb3 {
		DAabb3::from_center_half_extents(self.center, DVec3::splat(self.half_extent))
	}
}

/// Double-precision axis-aligned bounding box.
///
/// Rebuild regions and obstacle volumes are expressed with it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DAabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl DAabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Smallest box containing every point.
	pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
		let mut iter = points.into_iter();
		let first = iter.next()?;
		let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
		Some(Self { min, max })
	}

	/// Two AABBs overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &DAabb3) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Volume of the intersection (0 when only touching).
	pub fn overlap_volume(&self, other: &DAabb3) -> f64 {
		let extent = (self.max.min(other.max) - self.min.max(other.min)).max(DVec3::ZERO);
		extent.x * extent.y * extent.z
	}

	/// True if `other` lies entirely inside this box.
	#[inline]
	pub fn contains_aabb(&self, other: &DAabb3) -> bool {
		self.contains_point(other.min) && self.contains_point(other.max)
	}

	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Same box grown by `margin` on every side.
	#[inline]
	pub fn expanded(&self, margin: f64) -> Self {
		Self {
			min: self.min - DVec3::splat(margin),
			max: self.max + DVec3::splat(margin),
		}
	}

	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	#[inline]
	pub fn volume(&self) -> f64 {
		let size = self.size();
		size.x * size.y * size.z
	}
}
