//! The 26 neighbor directions: 6 faces, 12 edges, 8 corners.

use glam::IVec3;

pub const DIRECTION_COUNT: usize = 26;

/// Unit grid offsets, faces first, then edges, then corners.
pub const DIRECTIONS: [IVec3; DIRECTION_COUNT] = [
	// Faces
	IVec3::new(1, 0, 0),
	IVec3::new(-1, 0, 0),
	IVec3::new(0, 1, 0),
	IVec3::new(0, -1, 0),
	IVec3::new(0, 0, 1),
	IVec3::new(0, 0, -1),
	// Edges
	IVec3::new(1, 1, 0),
	IVec3::new(1, -1, 0),
	IVec3::new(-1, 1, 0),
	IVec3::new(-1, -1, 0),
	IVec3::new(1, 0, 1),
	IVec3::new(1, 0, -1),
	IVec3::new(-1, 0, 1),
	IVec3::new(-1, 0, -1),
	IVec3::new(0, 1, 1),
	IVec3::new(0, 1, -1),
	IVec3::new(0, -1, 1),
	IVec3::new(0, -1, -1),
	// Corners
	IVec3::new(1, 1, 1),
	IVec3::new(1, 1, -1),
	IVec3::new(1, -1, 1),
	IVec3::new(1, -1, -1),
	IVec3::new(-1, 1, 1),
	IVec3::new(-1, 1, -1),
	IVec3::new(-1, -1, 1),
	IVec3::new(-1, -1, -1),
];

/// Whether a child in `octant` touches the side of its parent facing `-dir`.
///
/// Used when descending into a neighbor found in direction `dir`: the
/// children that border the origin node sit on the neighbor's near side.
#[inline]
pub fn octant_faces_back(octant: u8, dir: IVec3) -> bool {
	axis_ok(octant & 1 != 0, dir.x) && axis_ok(octant & 2 != 0, dir.y) && axis_ok(octant & 4 != 0, dir.z)
}

#[inline]
fn axis_ok(positive_half: bool, d: i32) -> bool {
	match d {
		1 => !positive_half,
		-1 => positive_half,
		_ => true,
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn test_directions_unique_and_complete() {
		let set: HashSet<IVec3> = DIRECTIONS.iter().copied().collect();
		assert_eq!(set.len(), DIRECTION_COUNT);
		assert!(!set.contains(&IVec3::ZERO));
		assert!(DIRECTIONS.iter().all(|d| d.abs().max_element() == 1));
	}

	#[test]
	fn test_face_back_children() {
		// Neighbor on +X: its children with x-bit clear border us
		let count = (0..8u8).filter(|&o| octant_faces_back(o, IVec3::X)).count();
		assert_eq!(count, 4);
		assert!(octant_faces_back(0b110, IVec3::X));
		assert!(!octant_faces_back(0b001, IVec3::X));
	}

	#[test]
	fn test_edge_and_corner_back_children() {
		let edge = (0..8u8)
			.filter(|&o| octant_faces_back(o, IVec3::new(1, -1, 0)))
			.count();
		assert_eq!(edge, 2);

		let corner: Vec<u8> = (0..8u8)
			.filter(|&o| octant_faces_back(o, IVec3::new(-1, -1, 1)))
			.collect();
		assert_eq!(corner, vec![0b011]);
	}
}
