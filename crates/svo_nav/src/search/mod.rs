//! Path search over the adjacency graph.
//!
//! - [`astar`]: `PathSearch`, heuristics and search outcomes
//! - [`budget`]: expansion / time limits and search statistics

pub mod astar;
pub mod budget;

// Re-exports
pub use astar::{find_path, Heuristic, NotFoundReason, PathSearch, SearchConfig, SearchOutcome, SearchResult};
pub use budget::{SearchBudget, SearchStats};
