//! Matchday Balancer - balanced team generation for pickup football
//!
//! This crate aggregates peer ratings into one robust rating per player and
//! splits a matchday roster into balanced teams by solving a mixed-integer
//! program with hard pairing rules and optional balance rules.

pub mod config;
pub mod error;
pub mod matchday;
pub mod metrics;
pub mod rating;
pub mod solver;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchdayError, Result};
pub use types::*;

// Re-export key components
pub use matchday::{MatchdayService, MatchdayStore};
pub use rating::{OutlierFilteringAggregator, RatingAggregator, RatingStore};
pub use solver::TeamAssignmentSolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
