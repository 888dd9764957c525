//! 3D Morton (Z-order) codes.
//!
//! Interleaves 21 bits per axis: bit 3k = x bit k, 3k+1 = y bit k, 3k+2 = z bit k.
//! The lowest 3 bits of a code are therefore the node's octant within its
//! parent, and `code >> 3` is the parent's code.

use glam::UVec3;

/// Bits available per axis.
pub const AXIS_BITS: u32 = 21;

#[inline]
fn split_by_3(v: u32) -> u64 {
	let mut x = (v as u64) & 0x1f_ffff;
	x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
	x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
	x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
	x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
	x = (x | (x << 2)) & 0x1249_2492_4924_9249;
	x
}

#[inline]
fn compact_by_3(v: u64) -> u32 {
	let mut x = v & 0x1249_2492_4924_9249;
	x = (x | (x >> 2)) & 0x10c3_0c30_c30c_30c3;
	x = (x | (x >> 4)) & 0x100f_00f0_0f00_f00f;
	x = (x | (x >> 8)) & 0x001f_0000_ff00_00ff;
	x = (x | (x >> 16)) & 0x001f_0000_0000_ffff;
	x = (x | (x >> 32)) & 0x1f_ffff;
	x as u32
}

/// Encode grid coordinates into a Morton code.
#[inline]
pub fn encode(cell: UVec3) -> u64 {
	split_by_3(cell.x) | (split_by_3(cell.y) << 1) | (split_by_3(cell.z) << 2)
}

/// Decode a Morton code into grid coordinates.
#[inline]
pub fn decode(code: u64) -> UVec3 {
	UVec3::new(compact_by_3(code), compact_by_3(code >> 1), compact_by_3(code >> 2))
}

/// Code of the child in `octant`.
#[inline]
pub fn child(code: u64, octant: u8) -> u64 {
	(code << 3) | (octant as u64 & 7)
}

/// Octant of this node within its parent.
#[inline]
pub fn octant(code: u64) -> u8 {
	(code & 7) as u8
}
