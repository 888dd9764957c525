//! Scene-driven path queries.
//!
//! Loads a scene TOML (volume, obstacle boxes, queries), builds the
//! navigation octree and prints one result per query. Set `RUST_LOG=debug`
//! for build and search logs.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec3;
use serde::Serialize;
use svo_nav::search::NotFoundReason;
use svo_nav::{find_paths_parallel, NavResult, NavVolume, PathQuery, SearchOutcome};

use config::SceneConfig;

/// Sparse voxel octree path queries.
#[derive(Parser, Debug)]
#[command(name = "svo_query")]
#[command(about = "Builds a navigation octree from a scene file and runs its path queries")]
struct Args {
	/// Path to the scene TOML file.
	#[arg(short, long)]
	scene: PathBuf,

	/// Print results as JSON.
	#[arg(long)]
	json: bool,
}

/// Printable result of one query.
#[derive(Debug, Serialize)]
struct QueryReport {
	name: String,
	found: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	reason: Option<NotFoundReason>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
	cost: f64,
	length: f64,
	expanded: usize,
	raw_waypoints: usize,
	waypoints: Vec<[f64; 3]>,
}

impl QueryReport {
	fn new(name: &str, result: NavResult<SearchOutcome>) -> Self {
		let mut report = Self {
			name: name.to_string(),
			found: false,
			reason: None,
			error: None,
			cost: 0.0,
			length: 0.0,
			expanded: 0,
			raw_waypoints: 0,
			waypoints: Vec::new(),
		};

		match result {
			Ok(SearchOutcome::Found(found)) => {
				report.found = true;
				report.cost = found.cost;
				report.length = found.path.length();
				report.expanded = found.stats.expanded;
				report.raw_waypoints = found.raw_path.len();
				report.waypoints = found.path.positions().map(|p| p.to_array()).collect();
			}
			Ok(SearchOutcome::NotFound { reason, stats }) => {
				report.reason = Some(reason);
				report.expanded = stats.expanded;
			}
			Err(err) => report.error = Some(err.to_string()),
		}
		report
	}
}

fn main() -> Result<()> {
	env_logger::init();
	let args = Args::parse();

	let scene = SceneConfig::load(&args.scene)?;
	let config = scene.nav_config()?;
	log::info!(
		"Volume: edge {} m, depth {}, voxel {} m, {} obstacles",
		config.bounds.size(),
		config.max_depth,
		config.voxel_size(),
		scene.obstacles.len()
	);

	let volume = NavVolume::build(config, Arc::new(scene.world())).context("Building navigation octree")?;
	let snapshot = volume.snapshot();
	let stats = snapshot.build_stats();
	log::info!(
		"Built {} nodes ({} free / {} blocked leaves), {} links, {} probe calls in {} us",
		stats.total_nodes(),
		stats.free_leaves,
		stats.blocked_leaves,
		snapshot.graph().link_count(),
		stats.probe_calls,
		stats.duration_us
	);

	let queries: Vec<PathQuery> = scene
		.queries
		.iter()
		.map(|q| PathQuery::new(DVec3::from_array(q.start), DVec3::from_array(q.goal)))
		.collect();
	let results = find_paths_parallel(&snapshot, volume.probe().as_ref(), &queries, &scene.query_config());

	let reports: Vec<QueryReport> = scene
		.queries
		.iter()
		.zip(results)
		.map(|(q, result)| QueryReport::new(&q.name, result))
		.collect();

	if args.json {
		println!("{}", serde_json::to_string_pretty(&reports).context("Serializing results")?);
	} else {
		for report in &reports {
			print_report(report);
		}
	}
	Ok(())
}

fn print_report(report: &QueryReport) {
	if let Some(err) = &report.error {
		println!("{}: error: {err}", report.name);
		return;
	}
	if let Some(reason) = report.reason {
		println!("{}: no path ({reason:?}, {} expanded)", report.name, report.expanded);
		return;
	}

	println!(
		"{}: {} waypoints ({} raw), length {:.2}, cost {:.2}, {} expanded",
		report.name,
		report.waypoints.len(),
		report.raw_waypoints,
		report.length,
		report.cost,
		report.expanded
	);
	for p in &report.waypoints {
		println!("  ({:.2}, {:.2}, {:.2})", p[0], p[1], p[2]);
	}
}
