//! svo_nav - Sparse voxel octree navigation for 3D volumes
//!
//! Builds a sparse octree over a volume of free and obstructed space,
//! connects traversable leaves across all 26 directions and resolutions,
//! and answers point-to-point path queries with A* plus string pulling.
//!
//! # Features
//!
//! - **Adaptive octree**: large empty regions stay coarse, obstacle surfaces
//!   subdivide down to the voxel size
//! - **Cross-resolution links**: coarse and fine leaves link directly, with a
//!   clearance penalty that keeps paths off walls
//! - **Partial rebuilds**: re-probe only a dirty region and patch links
//!   around it
//! - **Versioned snapshots**: queries run lock-free on an immutable version
//!   while rebuilds publish new ones
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use svo_nav::{BoxWorld, CubeBounds, NavConfig, NavVolume, QueryConfig};
//!
//! let world = BoxWorld::new().with_box(DAabb3::new(min, max));
//! let config = NavConfig::new(CubeBounds::new(DVec3::ZERO, 500.0), 6);
//! let volume = NavVolume::build(config, Arc::new(world))?;
//!
//! let outcome = volume.find_path(start, goal, &QueryConfig::default())?;
//! if let Some(path) = outcome.path() {
//!     println!("{} waypoints, {:.1} m", path.len(), path.length());
//! }
//! ```

pub mod classifier;
pub mod error;
pub mod links;
pub mod metrics;
pub mod path;
pub mod probe;
pub mod probes;
pub mod smooth;

// Octree construction and storage
pub mod octree;
pub use octree::{BuildStats, CubeBounds, DAabb3, NavConfig, NodeRef, Octree, OctreeBuilder};

// A* over the adjacency graph
pub mod search;
pub use search::{NotFoundReason, PathSearch, SearchBudget, SearchConfig, SearchOutcome, SearchResult};

// Versioned volumes and off-thread work
pub mod pipeline;
pub mod volume;
pub use pipeline::{find_paths_parallel, AsyncRebuild, PathQuery, RebuildRequest, RebuildResult};
pub use volume::{NavSnapshot, NavVolume, QueryConfig, VolumeId};

// Re-export commonly used items
pub use classifier::{Occupancy, VoxelClassifier};
pub use error::{NavError, NavResult, ProbeError};
pub use links::{AdjacencyGraph, Link, LinkResolver};
pub use path::{NavPath, PathPoint};
pub use probe::{CollisionProbe, CoordinateTransform, Identity};
pub use probes::{BoxWorld, EmptyWorld};
pub use smooth::{PathSmoother, PruningMode, SmoothingConfig};

#[cfg(test)]
pub(crate) mod test_utils;
