//! Engine-agnostic metrics for navigation volumes.
//!
//! Feature-gated and runtime-toggled so collection costs nothing when
//! disabled.
//!
//! # Usage
//!
//! ```ignore
//! use svo_nav::metrics::COLLECT_METRICS;
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let metrics = volume.metrics();
//! println!("avg query {}us", metrics.avg_query_timing_us());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::links::AdjacencyGraph;
use crate::octree::BuildStats;
use crate::search::{SearchOutcome, SearchStats};

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window of recent values (e.g. timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl<T: Copy + Default + std::ops::Add<Output = T>> RollingWindow<T> {
    pub fn sum(&self) -> T {
        self.buffer.iter().copied().fold(T::default(), |acc, x| acc + x)
    }
}

impl RollingWindow<u64> {
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128)
    }
}

/// Volume-level statistics, updated on every build and query.
#[derive(Debug, Clone, Default)]
pub struct NavMetrics {
    // Structure
    /// Node count per octree layer (index = depth).
    pub nodes_per_layer: Vec<usize>,
    pub free_leaves: usize,
    pub blocked_leaves: usize,
    /// Directed links in the adjacency graph.
    pub link_count: usize,

    // Memory
    pub octree_memory_bytes: usize,
    pub graph_memory_bytes: usize,

    // Timing
    /// Build / rebuild times in microseconds.
    pub build_timings: RollingWindow<u64>,
    /// Query times in microseconds.
    pub query_timings: RollingWindow<u64>,
    pub last_build_us: u64,
    pub last_query_us: u64,

    // Counters
    pub total_builds: u64,
    pub total_queries: u64,
    pub paths_found: u64,
    pub paths_not_found: u64,
    /// Node expansions summed over all queries.
    pub total_expansions: u64,
}

impl NavMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset everything except the cumulative counters.
    pub fn reset(&mut self) {
        self.nodes_per_layer.clear();
        self.free_leaves = 0;
        self.blocked_leaves = 0;
        self.link_count = 0;
        self.octree_memory_bytes = 0;
        self.graph_memory_bytes = 0;
        self.build_timings.clear();
        self.query_timings.clear();
        self.last_build_us = 0;
        self.last_query_us = 0;
    }

    /// Record a finished build or rebuild (octree + links).
    pub fn record_build(&mut self, stats: &BuildStats, graph: &AdjacencyGraph, timing_us: u64) {
        if !is_enabled() {
            return;
        }

        self.nodes_per_layer.clone_from(&stats.nodes_per_layer);
        self.free_leaves = stats.free_leaves;
        self.blocked_leaves = stats.blocked_leaves;
        self.link_count = graph.link_count();
        self.octree_memory_bytes = stats.memory_bytes;
        self.graph_memory_bytes = graph.memory_bytes();
        self.build_timings.push(timing_us);
        self.last_build_us = timing_us;
        self.total_builds += 1;
    }

    /// Record one path query.
    pub fn record_query(&mut self, outcome: &SearchOutcome, timing_us: u64) {
        if !is_enabled() {
            return;
        }

        let stats: &SearchStats = outcome.stats();
        self.total_expansions += stats.expanded as u64;
        if outcome.is_found() {
            self.paths_found += 1;
        } else {
            self.paths_not_found += 1;
        }
        self.total_queries += 1;
        self.query_timings.push(timing_us);
        self.last_query_us = timing_us;
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes_per_layer.iter().sum()
    }

    pub fn avg_build_timing_us(&self) -> f64 {
        self.build_timings.average()
    }

    pub fn avg_query_timing_us(&self) -> f64 {
        self.query_timings.average()
    }

    /// Octree plus graph memory in MiB.
    pub fn memory_mb(&self) -> f64 {
        (self.octree_memory_bytes + self.graph_memory_bytes) as f64 / 1_048_576.0
    }
}
