//! Metrics for the matchday balancer
//!
//! Prometheus counters and histograms for team generation and rating
//! aggregation, renderable in the text exposition format.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RatingMetrics, SolverMetrics};
