//! NavVolume - one navigable region with versioned snapshots.
//!
//! Each volume owns its configuration, collision probe and transform. The
//! octree and adjacency graph live in an immutable [`NavSnapshot`]; a rebuild
//! produces a new snapshot and swaps it in, so queries in flight keep the
//! version they started with and never observe a partial rebuild.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use glam::{DAffine3, DVec3};
use web_time::Instant;

use crate::error::NavResult;
use crate::links::{AdjacencyGraph, LinkResolver};
use crate::metrics::NavMetrics;
use crate::octree::{BuildStats, DAabb3, NavConfig, Octree, OctreeBuilder};
use crate::probe::{CollisionProbe, CoordinateTransform};
use crate::search::{PathSearch, SearchConfig, SearchOutcome};
use crate::smooth::{PathSmoother, SmoothingConfig};

// =============================================================================
// VolumeId - unique identifier
// =============================================================================

/// Atomic counter for generating unique VolumeIds.
static VOLUME_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque volume identifier, unique within the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VolumeId(u64);

impl VolumeId {
    pub fn new() -> Self {
        Self(VOLUME_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for VolumeId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// QueryConfig
// =============================================================================

/// Per-query parameters: search plus post-processing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryConfig {
    pub search: SearchConfig,
    pub smoothing: SmoothingConfig,
}

impl QueryConfig {
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingConfig) -> Self {
        self.smoothing = smoothing;
        self
    }
}

// =============================================================================
// NavSnapshot - immutable version
// =============================================================================

/// One immutable octree version with its adjacency graph.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavSnapshot {
    version: u64,
    octree: Octree,
    graph: AdjacencyGraph,
    build_stats: BuildStats,
    /// Agent radius the octree was classified with.
    agent_clearance: f64,
}

impl NavSnapshot {
    pub fn new(version: u64, octree: Octree, graph: AdjacencyGraph, build_stats: BuildStats) -> Self {
        Self {
            version,
            octree,
            graph,
            build_stats,
            agent_clearance: 0.0,
        }
    }

    /// Record the agent radius the octree was built for. Clearance-aware
    /// pruning never sweeps a thinner agent than this.
    pub fn with_agent_clearance(mut self, agent_clearance: f64) -> Self {
        self.agent_clearance = agent_clearance;
        self
    }

    /// Monotonic per volume, starting at 1.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    pub fn build_stats(&self) -> &BuildStats {
        &self.build_stats
    }

    pub fn agent_clearance(&self) -> f64 {
        self.agent_clearance
    }

    /// Raw A* in the local frame, no smoothing.
    pub fn find_path(&self, start: DVec3, goal: DVec3, config: &SearchConfig) -> NavResult<SearchOutcome> {
        PathSearch::new(&self.octree, &self.graph, *config).find_path(start, goal)
    }

    /// Search then smooth, in the local frame.
    ///
    /// `SearchResult::raw_path` keeps the node chain; `path` is the smoothed
    /// result. `PruningMode::WithClearance` sweeps at least the agent radius.
    pub fn query<P: CollisionProbe + ?Sized>(
        &self,
        probe: &P,
        start: DVec3,
        goal: DVec3,
        config: &QueryConfig,
    ) -> NavResult<SearchOutcome> {
        match self.find_path(start, goal, &config.search)? {
            SearchOutcome::Found(mut result) => {
                let smoothing = config.smoothing.with_min_clearance(self.agent_clearance);
                result.path = PathSmoother::new(probe, smoothing).apply(&result.raw_path)?;
                Ok(SearchOutcome::Found(result))
            }
            not_found => Ok(not_found),
        }
    }
}

// =============================================================================
// NavVolume<P>
// =============================================================================

/// A navigable region: configuration, probe, transform and the current
/// snapshot.
///
/// Shareable across threads (`Arc<NavVolume<P>>`). Queries clone the current
/// snapshot `Arc` and run without holding any lock. Rebuilds are serialized
/// per volume; a failed rebuild leaves the current snapshot in place.
///
/// # Transform
///
/// The octree lives in the volume's local frame. `transform` maps local to
/// world; `find_path` and `rebuild` take world coordinates.
pub struct NavVolume<P: CollisionProbe> {
    id: VolumeId,
    config: NavConfig,
    probe: Arc<P>,
    transform: RwLock<DAffine3>,
    current: RwLock<Arc<NavSnapshot>>,
    rebuild_lock: Mutex<()>,
    metrics: Mutex<NavMetrics>,
}

impl<P: CollisionProbe> NavVolume<P> {
    /// Build the first snapshot (version 1) with identity transform.
    pub fn build(config: NavConfig, probe: Arc<P>) -> NavResult<Self> {
        config.validate()?;
        let started = Instant::now();
        let (octree, stats) = OctreeBuilder::new(&*probe, config.agent_clearance).build(config.bounds, config.max_depth)?;
        let graph = LinkResolver::new(config.clearance_weight).resolve(&octree);

        let mut metrics = NavMetrics::new();
        metrics.record_build(&stats, &graph, started.elapsed().as_micros() as u64);

        let agent_clearance = config.agent_clearance;
        let id = VolumeId::new();
        tracing::info!(volume = id.raw(), links = graph.link_count(), "nav volume ready");

        Ok(Self {
            id,
            config,
            probe,
            transform: RwLock::new(DAffine3::IDENTITY),
            current: RwLock::new(Arc::new(
                NavSnapshot::new(1, octree, graph, stats).with_agent_clearance(agent_clearance),
            )),
            rebuild_lock: Mutex::new(()),
            metrics: Mutex::new(metrics),
        })
    }

    pub fn with_transform(self, transform: DAffine3) -> Self {
        self.set_transform(transform);
        self
    }

    pub fn set_transform(&self, transform: DAffine3) {
        *self.transform.write().unwrap_or_else(PoisonError::into_inner) = transform;
    }

    pub fn transform(&self) -> DAffine3 {
        *self.transform.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> VolumeId {
        self.id
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn probe(&self) -> &Arc<P> {
        &self.probe
    }

    /// The current version. Stays valid across later rebuilds.
    pub fn snapshot(&self) -> Arc<NavSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    pub fn metrics(&self) -> NavMetrics {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[inline]
    pub fn world_to_local(&self, world: DVec3) -> DVec3 {
        self.transform().world_to_local(world)
    }

    #[inline]
    pub fn local_to_world(&self, local: DVec3) -> DVec3 {
        self.transform().local_to_world(local)
    }

    /// Re-probe a world-space region and publish a new version.
    ///
    /// The region is mapped to the local frame, grown by `rebuild_padding`
    /// and the agent clearance, and only cells touching it are re-classified.
    /// Links are re-resolved around the region only. Returns the new version.
    pub fn rebuild(&self, region: &DAabb3) -> NavResult<u64> {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();
        let previous = self.snapshot();

        let transform = self.transform();
        let corners = (0..8).map(|i| {
            let pick = |bit: usize, min: f64, max: f64| if i & bit != 0 { max } else { min };
            transform.world_to_local(DVec3::new(
                pick(1, region.min.x, region.max.x),
                pick(2, region.min.y, region.max.y),
                pick(4, region.min.z, region.max.z),
            ))
        });
        let Some(local) = DAabb3::from_points(corners) else {
            return Ok(previous.version());
        };
        let local = local.expanded(self.config.rebuild_padding + self.config.agent_clearance);

        let (octree, stats) =
            OctreeBuilder::new(&*self.probe, self.config.agent_clearance).rebuild(previous.octree(), &local)?;
        let graph = LinkResolver::new(self.config.clearance_weight).resolve_incremental(
            previous.octree(),
            previous.graph(),
            &octree,
            &local,
        );

        Ok(self.publish(previous.version() + 1, octree, graph, stats, started))
    }

    /// Rebuild everything from scratch and publish a new version.
    pub fn rebuild_all(&self) -> NavResult<u64> {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();
        let previous = self.snapshot();

        let (octree, stats) = OctreeBuilder::new(&*self.probe, self.config.agent_clearance)
            .build(self.config.bounds, self.config.max_depth)?;
        let graph = LinkResolver::new(self.config.clearance_weight).resolve(&octree);

        Ok(self.publish(previous.version() + 1, octree, graph, stats, started))
    }

    fn publish(&self, version: u64, octree: Octree, graph: AdjacencyGraph, stats: BuildStats, started: Instant) -> u64 {
        let elapsed_us = started.elapsed().as_micros() as u64;
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_build(&stats, &graph, elapsed_us);

        let snapshot =
            Arc::new(NavSnapshot::new(version, octree, graph, stats).with_agent_clearance(self.config.agent_clearance));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        tracing::debug!(volume = self.id.raw(), version, elapsed_us, "snapshot published");
        version
    }

    /// Search and smooth between two world-space points on the current
    /// version. Returned paths are in world space.
    pub fn find_path(&self, start: DVec3, goal: DVec3, config: &QueryConfig) -> NavResult<SearchOutcome> {
        let started = Instant::now();
        let snapshot = self.snapshot();
        let transform = self.transform();

        let outcome = snapshot.query(
            &*self.probe,
            transform.world_to_local(start),
            transform.world_to_local(goal),
            config,
        )?;
        let outcome = match outcome {
            SearchOutcome::Found(mut result) => {
                result.path = result.path.map_positions(|p| transform.local_to_world(p));
                result.raw_path = result.raw_path.map_positions(|p| transform.local_to_world(p));
                SearchOutcome::Found(result)
            }
            not_found => not_found,
        };

        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_query(&outcome, started.elapsed().as_micros() as u64);
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "volume_test.rs"]
mod volume_test;
