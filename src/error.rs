//! Error types for the matchday balancer
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. An infeasible team request is not an error: it is
//! reported through [`crate::types::SolveOutcome::Infeasible`].

use std::time::Duration;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchday scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchdayError {
    #[error("Invalid roster: {reason}")]
    InvalidRoster { reason: String },

    #[error("Invalid constraint: {reason}")]
    InvalidConstraint { reason: String },

    #[error("Constraint references unknown player: {name}")]
    UnknownPlayer { name: String },

    #[error("Invalid rating: {reason}")]
    InvalidRating { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Matchday not found: {date}")]
    MatchdayNotFound { date: String },

    #[error("Matchday already exists: {date}")]
    MatchdayExists { date: String },

    #[error("Player not found: {name}")]
    PlayerNotFound { name: String },

    #[error("Optimization engine failed: {message}")]
    SolverFailure { message: String },

    #[error("Optimization engine exceeded its time limit of {limit:?}")]
    SolverTimedOut { limit: Duration },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchdayError {
    /// Whether this error means "the caller passed bad input" rather than
    /// "the system could not produce an answer"
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MatchdayError::InvalidRoster { .. }
                | MatchdayError::InvalidConstraint { .. }
                | MatchdayError::UnknownPlayer { .. }
                | MatchdayError::InvalidRating { .. }
                | MatchdayError::ConfigurationError { .. }
        )
    }
}
