//! Metrics collection using Prometheus
//!
//! This module records solver and rating aggregation activity of the
//! matchday balancer using Prometheus metrics.

use crate::error::MatchdayError;
use crate::rating::AggregatedRating;
use crate::types::SolveOutcome;
use anyhow::Result;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the matchday balancer
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Team generation metrics
    solver_metrics: SolverMetrics,

    /// Peer rating metrics
    rating_metrics: RatingMetrics,
}

/// Team generation metrics
#[derive(Clone)]
pub struct SolverMetrics {
    /// Completed solves by outcome (assigned, infeasible)
    pub solves_total: IntCounterVec,

    /// Solves that failed with an error, by kind
    pub solve_errors_total: IntCounterVec,

    /// Wall time of a solve
    pub solve_duration_seconds: Histogram,

    /// Players per solved roster
    pub roster_size: Histogram,

    /// Rating spread of the latest assignment
    pub rating_spread: Gauge,
}

/// Peer rating metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Player ratings aggregated
    pub aggregations_total: IntCounter,

    /// Samples discarded as outliers
    pub samples_discarded_total: IntCounter,

    /// Aggregation time
    pub aggregation_duration_seconds: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let solver_metrics = SolverMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;

        Ok(Self {
            registry,
            solver_metrics,
            rating_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn solver(&self) -> &SolverMetrics {
        &self.solver_metrics
    }

    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Record a finished solve
    pub fn record_solve(&self, outcome: &SolveOutcome, roster_size: usize, duration: Duration) {
        self.solver_metrics
            .solves_total
            .with_label_values(&[outcome.label()])
            .inc();

        self.solver_metrics
            .solve_duration_seconds
            .observe(duration.as_secs_f64());

        self.solver_metrics.roster_size.observe(roster_size as f64);

        if let Some(assignment) = outcome.assignment() {
            self.solver_metrics
                .rating_spread
                .set(assignment.rating_spread());
        }
    }

    /// Record a solve that ended in an error
    pub fn record_solve_error(&self, error: &anyhow::Error) {
        let kind = match error.downcast_ref::<MatchdayError>() {
            Some(MatchdayError::SolverTimedOut { .. }) => "timeout",
            Some(MatchdayError::SolverFailure { .. }) => "engine",
            Some(e) if e.is_invalid_input() => "invalid_input",
            _ => "other",
        };

        self.solver_metrics
            .solve_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record one player's rating aggregation
    pub fn record_aggregation(&self, result: &AggregatedRating, duration: Duration) {
        self.rating_metrics.aggregations_total.inc();
        self.rating_metrics
            .samples_discarded_total
            .inc_by(result.samples_discarded as u64);
        self.rating_metrics
            .aggregation_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Encode all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl SolverMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let solves_total = IntCounterVec::new(
            Opts::new(
                "matchday_balancer_solves_total",
                "Completed team generation solves",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(solves_total.clone()))?;

        let solve_errors_total = IntCounterVec::new(
            Opts::new(
                "matchday_balancer_solve_errors_total",
                "Team generation solves that failed",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(solve_errors_total.clone()))?;

        let solve_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "matchday_balancer_solve_duration_seconds",
                "Team generation solve time",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        registry.register(Box::new(solve_duration_seconds.clone()))?;

        let roster_size = Histogram::with_opts(
            HistogramOpts::new("matchday_balancer_roster_size", "Players per solved roster")
                .buckets(vec![4.0, 8.0, 12.0, 15.0, 18.0, 21.0, 24.0, 30.0]),
        )?;
        registry.register(Box::new(roster_size.clone()))?;

        let rating_spread = Gauge::new(
            "matchday_balancer_rating_spread",
            "Strongest minus weakest team rating of the latest assignment",
        )?;
        registry.register(Box::new(rating_spread.clone()))?;

        Ok(Self {
            solves_total,
            solve_errors_total,
            solve_duration_seconds,
            roster_size,
            rating_spread,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let aggregations_total = IntCounter::new(
            "matchday_balancer_rating_aggregations_total",
            "Player ratings aggregated",
        )?;
        registry.register(Box::new(aggregations_total.clone()))?;

        let samples_discarded_total = IntCounter::new(
            "matchday_balancer_rating_samples_discarded_total",
            "Rating samples discarded as outliers",
        )?;
        registry.register(Box::new(samples_discarded_total.clone()))?;

        let aggregation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "matchday_balancer_rating_aggregation_duration_seconds",
                "Rating aggregation time",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01]),
        )?;
        registry.register(Box::new(aggregation_duration_seconds.clone()))?;

        Ok(Self {
            aggregations_total,
            samples_discarded_total,
            aggregation_duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InfeasibilityCause, Player, Team, TeamAssignment};

    fn assignment() -> SolveOutcome {
        SolveOutcome::Assigned(TeamAssignment {
            teams: vec![
                Team {
                    players: vec![Player::goalkeeper("k")],
                    rating: 7.0,
                },
                Team {
                    players: vec![Player::goalkeeper("j")],
                    rating: 4.5,
                },
            ],
        })
    }

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        assert_eq!(collector.solver().solves_total.with_label_values(&["assigned"]).get(), 0);
        assert_eq!(collector.rating().aggregations_total.get(), 0);
    }

    #[test]
    fn test_solve_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_solve(&assignment(), 2, Duration::from_millis(20));
        collector.record_solve(
            &SolveOutcome::Infeasible(InfeasibilityCause::NoFeasibleAssignment),
            6,
            Duration::from_millis(5),
        );

        let solver = collector.solver();
        assert_eq!(solver.solves_total.with_label_values(&["assigned"]).get(), 1);
        assert_eq!(solver.solves_total.with_label_values(&["infeasible"]).get(), 1);
        assert_eq!(solver.solve_duration_seconds.get_sample_count(), 2);
        assert_eq!(solver.rating_spread.get(), 2.5);
    }

    #[test]
    fn test_error_kinds() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_solve_error(
            &MatchdayError::SolverTimedOut {
                limit: Duration::from_secs(1),
            }
            .into(),
        );
        collector.record_solve_error(
            &MatchdayError::UnknownPlayer {
                name: "x".to_string(),
            }
            .into(),
        );
        collector.record_solve_error(&anyhow::anyhow!("boom"));

        let errors = &collector.solver().solve_errors_total;
        assert_eq!(errors.with_label_values(&["timeout"]).get(), 1);
        assert_eq!(errors.with_label_values(&["invalid_input"]).get(), 1);
        assert_eq!(errors.with_label_values(&["other"]).get(), 1);
        assert_eq!(errors.with_label_values(&["engine"]).get(), 0);
    }

    #[test]
    fn test_shared_registry() {
        let registry = Arc::new(Registry::new());
        let collector = MetricsCollector::with_registry(registry.clone()).unwrap();
        collector.record_solve(&assignment(), 2, Duration::from_millis(3));

        assert!(Arc::ptr_eq(&collector.registry(), &registry));
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"matchday_balancer_solve_duration_seconds".to_string()));

        // a second collector cannot register the same metrics again
        assert!(MetricsCollector::with_registry(registry).is_err());
    }

    #[test]
    fn test_aggregation_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let result = AggregatedRating {
            rating: 5.0,
            samples_used: 4,
            samples_discarded: 1,
        };

        collector.record_aggregation(&result, Duration::from_nanos(1000));
        collector.record_aggregation(&result, Duration::from_nanos(1000));

        assert_eq!(collector.rating().aggregations_total.get(), 2);
        assert_eq!(collector.rating().samples_discarded_total.get(), 2);
    }

    #[test]
    fn test_render_text_format() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_solve(&assignment(), 2, Duration::from_millis(1));

        let text = collector.render().unwrap();
        assert!(text.contains("matchday_balancer_solves_total{outcome=\"assigned\"} 1"));
        assert!(text.contains("matchday_balancer_rating_spread 2.5"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
