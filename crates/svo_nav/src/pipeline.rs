//! Off-thread rebuilds and batched queries.
//!
//! # Flow
//!
//! ```text
//! Caller                            Async (rayon)
//! ┌──────────────────┐
//! │ Capture request  │
//! │ (volume, region) │
//! └────────┬─────────┘
//!          │ start()
//!          ▼
//!                                   ┌──────────────────┐
//!                                   │ rebuild()        │
//!                                   │ (probe, links,   │
//!                                   │  publish)        │
//!                                   └────────┬─────────┘
//! ┌──────────────────┐                       │
//! │ poll_results()   │◄──────────────────────┘
//! └──────────────────┘
//! ```
//!
//! Queries never wait on a rebuild: they keep using the snapshot they
//! cloned until the new version is published.
//!
//! # Usage
//!
//! ```ignore
//! let mut rebuilds = AsyncRebuild::new();
//! rebuilds.start(RebuildRequest::region(volume.clone(), dirty_box));
//!
//! // Poll each frame
//! if let Some(result) = rebuilds.poll_results() {
//!     match result.outcome {
//!         Ok(version) => log::info!("nav version {version}"),
//!         Err(err) => log::warn!("rebuild failed: {err}"),
//!     }
//! }
//! ```

use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, TryRecvError};
use glam::DVec3;
use rayon::prelude::*;
use web_time::Instant;

use crate::error::NavResult;
use crate::octree::DAabb3;
use crate::probe::CollisionProbe;
use crate::search::SearchOutcome;
use crate::volume::{NavSnapshot, NavVolume, QueryConfig, VolumeId};

// =============================================================================
// AsyncRebuild
// =============================================================================

/// Request to rebuild a volume off-thread.
pub struct RebuildRequest<P: CollisionProbe> {
	pub volume: Arc<NavVolume<P>>,
	/// World-space region to re-probe; `None` rebuilds everything.
	pub region: Option<DAabb3>,
}

impl<P: CollisionProbe> RebuildRequest<P> {
	pub fn region(volume: Arc<NavVolume<P>>, region: DAabb3) -> Self {
		Self {
			volume,
			region: Some(region),
		}
	}

	pub fn full(volume: Arc<NavVolume<P>>) -> Self {
		Self { volume, region: None }
	}
}

/// Result of an async rebuild.
#[derive(Debug)]
pub struct RebuildResult {
	pub volume_id: VolumeId,
	/// New version on success. On failure the previous version stays live.
	pub outcome: NavResult<u64>,
	/// Rebuild time in microseconds.
	pub elapsed_us: u64,
}

/// Non-blocking rebuild pipeline on rayon's thread pool.
///
/// One rebuild in flight at a time.
pub struct AsyncRebuild {
	/// Receiver for pending result.
	receiver: Option<Receiver<RebuildResult>>,
}

impl AsyncRebuild {
	pub fn new() -> Self {
		Self { receiver: None }
	}

	/// Check if a rebuild is running.
	pub fn is_busy(&self) -> bool {
		self.receiver.is_some()
	}

	/// Start a rebuild.
	///
	/// Returns `true` if started, `false` if already busy.
	pub fn start<P: CollisionProbe + 'static>(&mut self, request: RebuildRequest<P>) -> bool {
		if self.is_busy() {
			return false;
		}

		let (sender, receiver) = channel::bounded(1);
		self.receiver = Some(receiver);

		rayon::spawn(move || {
			let result = run_rebuild(request);
			// Ignore send error (receiver dropped = cancelled)
			let _ = sender.send(result);
		});

		true
	}

	/// Poll for results (non-blocking).
	///
	/// Returns `Some(result)` when complete, `None` if still running.
	pub fn poll_results(&mut self) -> Option<RebuildResult> {
		let receiver = self.receiver.as_ref()?;

		match receiver.try_recv() {
			Ok(result) => {
				self.receiver = None;
				Some(result)
			}
			Err(TryRecvError::Empty) => None,
			Err(TryRecvError::Disconnected) => {
				self.receiver = None;
				None
			}
		}
	}

	/// Stop waiting for the pending rebuild.
	///
	/// The worker still finishes and publishes its version; only the result
	/// is dropped.
	pub fn cancel(&mut self) {
		self.receiver = None;
	}
}

impl Default for AsyncRebuild {
	fn default() -> Self {
		Self::new()
	}
}

#[tracing::instrument(skip_all, name = "pipeline::rebuild")]
fn run_rebuild<P: CollisionProbe>(request: RebuildRequest<P>) -> RebuildResult {
	let RebuildRequest { volume, region } = request;
	let started = Instant::now();

	let outcome = match region {
		Some(region) => volume.rebuild(&region),
		None => volume.rebuild_all(),
	};
	if let Err(err) = &outcome {
		tracing::warn!(volume = volume.id().raw(), %err, "rebuild failed");
	}

	RebuildResult {
		volume_id: volume.id(),
		outcome,
		elapsed_us: started.elapsed().as_micros() as u64,
	}
}

// =============================================================================
// Batched queries
// =============================================================================

/// Start / goal pair in the snapshot's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathQuery {
	pub start: DVec3,
	pub goal: DVec3,
}

impl PathQuery {
	pub fn new(start: DVec3, goal: DVec3) -> Self {
		Self { start, goal }
	}
}

/// Run independent queries in parallel against one snapshot.
///
/// Results are in query order. Each search owns its open and closed sets.
#[tracing::instrument(skip_all, name = "pipeline::find_paths", fields(queries = queries.len()))]
pub fn find_paths_parallel<P: CollisionProbe + ?Sized>(
	snapshot: &NavSnapshot,
	probe: &P,
	queries: &[PathQuery],
	config: &QueryConfig,
) -> Vec<NavResult<SearchOutcome>> {
	queries
		.par_iter()
		.map(|q| snapshot.query(probe, q.start, q.goal, config))
		.collect()
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
