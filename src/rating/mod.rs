//! Peer rating aggregation and storage
//!
//! This module turns the scores raters submit for a player into one
//! representative rating, robust to outlying scores, and defines the storage
//! interface those scores are read from.

pub mod aggregator;
pub mod statistics;
pub mod storage;

// Re-export commonly used types
pub use aggregator::{aggregate, AggregatedRating, OutlierFilteringAggregator, RatingAggregator};
pub use statistics::SampleStats;
pub use storage::{InMemoryRatingStore, PlayerRecord, RatingStore};
