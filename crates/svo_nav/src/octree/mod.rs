//! Sparse voxel octree of free and blocked space.
//!
//! # Depth Convention
//!
//! Depth 0 = root (one cube covering the whole volume), depth `max_depth`
//! = finest voxels.
//!
//! ```text
//! Cell Size = root_size / 2^depth
//! ```
//!
//! # Module Structure
//!
//! - [`bounds`]: `CubeBounds` node cubes, `DAabb3` regions
//! - [`morton`]: Z-order codes that sort each layer
//! - [`node`]: `NavNode`, `NodeRef`, `NodeKey`
//! - [`direction`]: the 26 neighbor offsets
//! - [`config`]: `NavConfig` resolution and agent parameters
//! - [`tree`]: `Octree` layered storage and point location
//! - [`build`]: `OctreeBuilder` construction and partial rebuild

pub mod bounds;
pub mod build;
pub mod config;
pub mod direction;
pub mod morton;
pub mod node;
pub mod stats;
pub mod tree;

// Re-exports
pub use bounds::{CubeBounds, DAabb3};
pub use build::OctreeBuilder;
pub use config::{NavConfig, MAX_DEPTH};
pub use direction::{DIRECTIONS, DIRECTION_COUNT};
pub use node::{NavNode, NodeKey, NodeRef, NodeState};
pub use stats::BuildStats;
pub use tree::Octree;
