//! Work limits for a single path search.
//!
//! Bounds the cost of a query that cannot reach its goal (or is asked to
//! cross a huge volume) so callers never block on an unbounded search.

use std::time::Duration;

/// Limits on one A* run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchBudget {
	/// Maximum node expansions (0 = unlimited).
	pub max_expansions: usize,
	/// Wall-clock limit, checked every few expansions.
	pub timeout: Option<Duration>,
}

impl SearchBudget {
	/// Default budget with a generous expansion cap.
	pub const DEFAULT: Self = Self {
		max_expansions: 200_000,
		timeout: None,
	};

	/// Unlimited budget for offline queries and tests.
	pub const UNLIMITED: Self = Self {
		max_expansions: 0,
		timeout: None,
	};

	/// Small budget for per-frame queries.
	pub const INTERACTIVE: Self = Self {
		max_expansions: 20_000,
		timeout: Some(Duration::from_millis(4)),
	};

	/// Check if more expansions can be performed.
	#[inline]
	pub fn can_expand(&self, performed: usize) -> bool {
		self.max_expansions == 0 || performed < self.max_expansions
	}
}

impl Default for SearchBudget {
	fn default() -> Self {
		Self::DEFAULT
	}
}

/// Statistics from one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
	/// Nodes popped from the open set and expanded.
	pub expanded: usize,
	/// Entries pushed onto the open set.
	pub pushed: usize,
	/// Wall time in microseconds.
	pub elapsed_us: u64,
}
