//! Configuration management for the matchday balancer
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for team generation.

pub mod app;
pub mod rating;
pub mod teams;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings, SolverSettings};
pub use rating::RatingConfig;
pub use teams::SolverConfiguration;
