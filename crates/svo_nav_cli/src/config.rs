//! Scene files: volume, obstacles and queries.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::DVec3;
use serde::Deserialize;
use svo_nav::search::Heuristic;
use svo_nav::{
	BoxWorld, CubeBounds, DAabb3, NavConfig, PruningMode, QueryConfig, SearchBudget, SearchConfig, SmoothingConfig,
};

/// Root of a scene TOML file.
#[derive(Debug, Deserialize)]
pub struct SceneConfig {
	pub volume: VolumeConfig,
	/// Search and smoothing settings shared by every query.
	#[serde(default)]
	pub query: QuerySettings,
	/// Solid axis-aligned boxes.
	#[serde(default)]
	pub obstacles: Vec<ObstacleConfig>,
	pub queries: Vec<QueryEntry>,
}

/// Volume placement and resolution.
///
/// Resolution is either `voxel_size` (depth derived from `size`) or an
/// explicit `max_depth`.
#[derive(Debug, Deserialize)]
pub struct VolumeConfig {
	#[serde(default)]
	pub center: [f64; 3],
	/// Edge length of the root cube.
	pub size: f64,
	pub voxel_size: Option<f64>,
	pub max_depth: Option<u8>,
	/// Agent radius.
	#[serde(default)]
	pub clearance: f64,
	#[serde(default = "default_clearance_weight")]
	pub clearance_weight: f64,
}

/// Search and smoothing settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
	pub heuristic: HeuristicName,
	pub estimate_weight: f64,
	/// Discount for coarse leaves (0 = off).
	pub node_size_preference: f64,
	/// Constant cost per hop instead of link distances.
	pub unit_cost: Option<f64>,
	/// 0 = unlimited.
	pub max_expansions: usize,
	pub timeout_ms: Option<u64>,
	pub pruning: PruningName,
	pub spline_subdivisions: u32,
}

impl Default for QuerySettings {
	fn default() -> Self {
		Self {
			heuristic: HeuristicName::Euclidean,
			estimate_weight: 1.0,
			node_size_preference: 0.0,
			unit_cost: None,
			max_expansions: SearchBudget::DEFAULT.max_expansions,
			timeout_ms: None,
			pruning: PruningName::WithoutClearance,
			spline_subdivisions: 0,
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicName {
	Euclidean,
	Manhattan,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruningName {
	None,
	WithoutClearance,
	WithClearance,
}

#[derive(Debug, Deserialize)]
pub struct ObstacleConfig {
	pub min: [f64; 3],
	pub max: [f64; 3],
}

/// One start / goal pair.
#[derive(Debug, Deserialize)]
pub struct QueryEntry {
	pub name: String,
	pub start: [f64; 3],
	pub goal: [f64; 3],
}

fn default_clearance_weight() -> f64 {
	1.0
}

impl SceneConfig {
	/// Load and validate a scene TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scene file: {}", path.display()))?;
		let scene: SceneConfig = toml::from_str(&content).with_context(|| "Failed to parse scene TOML")?;

		if scene.queries.is_empty() {
			anyhow::bail!("Scene must have at least one query");
		}
		match (scene.volume.voxel_size, scene.volume.max_depth) {
			(Some(_), Some(_)) => anyhow::bail!("Set either volume.voxel_size or volume.max_depth, not both"),
			(None, None) => anyhow::bail!("volume.voxel_size or volume.max_depth is required"),
			_ => {}
		}
		for (i, obstacle) in scene.obstacles.iter().enumerate() {
			if (0..3).any(|axis| obstacle.min[axis] > obstacle.max[axis]) {
				anyhow::bail!("Obstacle {i}: min {:?} exceeds max {:?}", obstacle.min, obstacle.max);
			}
		}
		scene.query_config().search.validate().context("Invalid query section")?;

		Ok(scene)
	}

	/// Navigation config for the volume section.
	pub fn nav_config(&self) -> Result<NavConfig> {
		let volume = &self.volume;
		let center = DVec3::from_array(volume.center);
		let config = match (volume.voxel_size, volume.max_depth) {
			(Some(voxel_size), _) => NavConfig::from_volume_size(center, volume.size, voxel_size)?,
			(None, Some(max_depth)) => NavConfig::new(CubeBounds::new(center, volume.size * 0.5), max_depth),
			(None, None) => anyhow::bail!("volume.voxel_size or volume.max_depth is required"),
		}
		.with_clearance(volume.clearance)
		.with_clearance_weight(volume.clearance_weight);

		config.validate().context("Invalid volume section")?;
		Ok(config)
	}

	pub fn world(&self) -> BoxWorld {
		BoxWorld::from_boxes(
			self.obstacles
				.iter()
				.map(|o| DAabb3::new(DVec3::from_array(o.min), DVec3::from_array(o.max))),
		)
	}

	pub fn query_config(&self) -> QueryConfig {
		let q = &self.query;
		let heuristic = match q.heuristic {
			HeuristicName::Euclidean => Heuristic::Euclidean,
			HeuristicName::Manhattan => Heuristic::Manhattan,
		};
		let mode = match q.pruning {
			PruningName::None => PruningMode::None,
			PruningName::WithoutClearance => PruningMode::WithoutClearance,
			PruningName::WithClearance => PruningMode::WithClearance,
		};

		let mut search = SearchConfig::default()
			.with_heuristic(heuristic)
			.with_estimate_weight(q.estimate_weight)
			.with_node_size_preference(q.node_size_preference)
			.with_budget(SearchBudget {
				max_expansions: q.max_expansions,
				timeout: q.timeout_ms.map(Duration::from_millis),
			});
		if let Some(unit_cost) = q.unit_cost {
			search = search.with_unit_cost(unit_cost);
		}

		// The volume raises the clearance sweep to the agent radius itself.
		QueryConfig::default()
			.with_search(search)
			.with_smoothing(SmoothingConfig::default().with_mode(mode).with_spline(q.spline_subdivisions))
	}
}
