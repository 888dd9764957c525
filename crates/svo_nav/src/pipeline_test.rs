use std::time::Duration;

use glam::DVec3;

use super::*;
use crate::error::NavError;
use crate::octree::{CubeBounds, NavConfig};
use crate::probes::BoxWorld;
use crate::search::NotFoundReason;
use crate::test_utils::SharedWorld;

const HALF: f64 = 500.0;

fn blocker() -> DAabb3 {
    DAabb3::new(DVec3::new(-HALF, -62.5, -HALF), DVec3::new(HALF, 62.5, HALF))
}

fn volume(world: Arc<SharedWorld>) -> Arc<NavVolume<SharedWorld>> {
    let config = NavConfig::new(CubeBounds::new(DVec3::ZERO, HALF), 4);
    Arc::new(NavVolume::build(config, world).expect("build succeeds"))
}

fn wait(pipeline: &mut AsyncRebuild) -> RebuildResult {
    for _ in 0..5000 {
        if let Some(result) = pipeline.poll_results() {
            return result;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("rebuild did not finish");
}

// =========================================================================
// Batch 1: Async Rebuild Tests
// =========================================================================

/// A region rebuild runs off-thread and publishes a new version.
#[test]
fn test_async_region_rebuild() {
    let world = Arc::new(SharedWorld::default());
    let volume = volume(Arc::clone(&world));
    let mut pipeline = AsyncRebuild::new();
    assert!(!pipeline.is_busy());

    world.add_box(blocker());
    assert!(pipeline.start(RebuildRequest::region(Arc::clone(&volume), blocker())));
    assert!(pipeline.is_busy());

    let result = wait(&mut pipeline);
    assert!(!pipeline.is_busy());
    assert_eq!(result.volume_id, volume.id());
    assert_eq!(result.outcome, Ok(2));

    let outcome = volume
        .find_path(DVec3::new(0.0, 300.0, 0.0), DVec3::new(0.0, -300.0, 0.0), &QueryConfig::default())
        .expect("endpoints are valid");
    assert_eq!(outcome.not_found_reason(), Some(NotFoundReason::Disconnected));
}

/// Failures are delivered as results; the volume keeps its version.
#[test]
fn test_async_rebuild_failure() {
    let world = Arc::new(SharedWorld::default());
    let volume = volume(Arc::clone(&world));
    let mut pipeline = AsyncRebuild::new();

    world.set_failing(true);
    assert!(pipeline.start(RebuildRequest::full(Arc::clone(&volume))));
    let result = wait(&mut pipeline);

    assert!(matches!(result.outcome, Err(NavError::ProbeUnavailable(_))));
    assert_eq!(volume.version(), 1);
}

/// Only one rebuild at a time; cancel frees the slot.
#[test]
fn test_cannot_start_when_busy() {
    let world = Arc::new(SharedWorld::default());
    let volume = volume(world);
    let mut pipeline = AsyncRebuild::new();

    assert!(pipeline.start(RebuildRequest::full(Arc::clone(&volume))));
    assert!(!pipeline.start(RebuildRequest::full(Arc::clone(&volume))));

    pipeline.cancel();
    assert!(!pipeline.is_busy());
    assert!(pipeline.poll_results().is_none());
    assert!(pipeline.start(RebuildRequest::full(volume)));
}

// =========================================================================
// Batch 2: Parallel Query Tests
// =========================================================================

/// Parallel results match sequential ones, in order.
#[test]
fn test_parallel_queries_match_sequential() {
    let world = BoxWorld::new().with_box(DAabb3::new(
        DVec3::new(-30.0, -500.0, -30.0),
        DVec3::new(30.0, 200.0, 30.0),
    ));
    let config = NavConfig::new(CubeBounds::new(DVec3::ZERO, HALF), 4);
    let volume = NavVolume::build(config, Arc::new(world)).expect("build succeeds");
    let snapshot = volume.snapshot();

    let queries: Vec<PathQuery> = (0..16)
        .map(|i| {
            let t = i as f64 * 40.0;
            PathQuery::new(DVec3::new(-300.0, t - 300.0, 10.0), DVec3::new(300.0, 280.0 - t, -10.0))
        })
        .chain([PathQuery::new(DVec3::new(0.0, 900.0, 0.0), DVec3::ZERO)])
        .collect();

    let parallel = find_paths_parallel(&snapshot, volume.probe().as_ref(), &queries, &QueryConfig::default());
    assert_eq!(parallel.len(), queries.len());

    for (query, result) in queries.iter().zip(&parallel) {
        let sequential = snapshot.query(volume.probe().as_ref(), query.start, query.goal, &QueryConfig::default());
        match (result, sequential) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.path(), b.path());
                assert_eq!(a.not_found_reason(), b.not_found_reason());
            }
            (Err(a), Err(b)) => assert_eq!(*a, b),
            (a, b) => panic!("parallel {a:?} != sequential {b:?}"),
        }
    }
    assert!(matches!(parallel[16], Err(NavError::PointOutsideBounds { .. })));
}
